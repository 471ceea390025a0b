use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{8,20}$").expect("Invalid phone regex"));

static ENROLLMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{4,20}$").expect("Invalid enrollment regex"));

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 长度 5..=16
    if username.len() < 5 || username.len() > 16 {
        return Err("Username length must be between 5 and 16 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !PHONE_RE.is_match(phone) {
        return Err("Phone number format is invalid");
    }
    if phone.chars().filter(|c| c.is_ascii_digit()).count() < 8 {
        return Err("Phone number must contain at least 8 digits");
    }
    Ok(())
}

pub fn validate_enrollment_number(value: &str) -> Result<(), &'static str> {
    if !ENROLLMENT_RE.is_match(value) {
        return Err("Enrollment number must be 4-20 letters, digits or hyphens");
    }
    Ok(())
}

/// 校验必填文本字段：去除首尾空白后非空，且不超过 max 个字符
pub fn validate_required_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    if trimmed.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

/// 可选字段：空字符串视为未填写
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 密码策略：至少 8 个字符，同时包含大写字母、小写字母和数字，且不在常见弱密码列表中
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    const WEAK: [&str; 8] = [
        "password1",
        "qwerty123",
        "admin123",
        "abcd1234",
        "escola123",
        "senha1234",
        "school123",
        "welcome1",
    ];
    if WEAK.iter().any(|weak| password.eq_ignore_ascii_case(weak)) {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("secretaria").is_ok());
        assert!(validate_username("ana").is_err());
        assert!(validate_username("this_name_is_too_long").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("maria.silva@escola.com.br").is_ok());
        assert!(validate_email("maria@").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("+55 (11) 98765-4321").is_ok());
        assert!(validate_phone("11987654321").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("abc-defg-hij").is_err());
    }

    #[test]
    fn test_enrollment_number_rules() {
        assert!(validate_enrollment_number("2025000123").is_ok());
        assert!(validate_enrollment_number("12").is_err());
        assert!(validate_enrollment_number("2025/001").is_err());
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("name", "  Ana  ", 10).is_ok());
        assert_eq!(
            validate_required_text("name", "   ", 10).unwrap_err(),
            "name is required"
        );
        assert!(validate_required_text("name", "Joãozinho da Silva", 5).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" x ".into())), Some("x".into()));
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("SecurePass123").is_valid);

        let short = validate_password("Ab1");
        assert!(
            short
                .errors
                .contains(&"Password must be at least 8 characters long")
        );

        let no_upper = validate_password("abcd12345");
        assert!(
            no_upper
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );

        let no_digit = validate_password("AbcdEfgh");
        assert!(
            no_digit
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Escola123");
        assert!(!result.is_valid);
        assert!(validate_password_simple("Escola123").is_err());
    }
}
