/// 声明类型的实例可以作为某个契约交付
///
/// ```
/// use std::sync::Arc;
/// use di_compose::{implements, Injectable};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Injectable for English {
///     type Dependencies = ();
///     fn inject((): Self::Dependencies) -> Self {
///         English
///     }
/// }
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// implements!(English => dyn Greeter);
/// ```
#[macro_export]
macro_rules! implements {
    ($($implementation:ty => $contract:ty),+ $(,)?) => {
        $(
            impl $crate::container::Upcast<$contract> for $implementation {
                fn upcast(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// 服务解析宏
#[macro_export]
macro_rules! resolve {
    ($provider:expr, $type:ty) => {
        $provider.resolve::<$type>()
    };
}
