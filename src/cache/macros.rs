/// 声明对象缓存插件，程序加载时自动注册
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        fn __register_object_cache_plugin() {
            use std::sync::Arc;
            use $crate::cache::register::register_object_cache_plugin;

            register_object_cache_plugin(
                $name,
                Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new()?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::traits::ObjectCache>)
                    })
                }),
            );
        }
    };
}
