use sea_orm::sea_query::LikeExpr;

/// 转义 LIKE 模式中的通配符，避免用户输入的 % 和 _ 被当作通配符
pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 构造 `%term%` 形式的模糊匹配表达式，带 ESCAPE 子句
pub fn like_contains(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like_pattern(term.trim()))).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("Ana"), "Ana");
        assert_eq!(escape_like_pattern("50%"), "50\\%");
        assert_eq!(escape_like_pattern("a_b"), "a\\_b");
        assert_eq!(escape_like_pattern("c:\\x"), "c:\\\\x");
    }
}
