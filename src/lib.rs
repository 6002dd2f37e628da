//! 依赖注入组合扩展
//!
//! 在一个最小的宿主容器之上提供两种组合能力：
//! - **别名**：`alias::<dyn Contract, Implementation>()` 以契约暴露已注册的实现，共享同一实例
//! - **装饰**：`decorate::<dyn Contract, Decorator>()` 用装饰器包裹契约现有的注册，可多次叠加
//!
//! ```
//! use std::sync::Arc;
//! use di_compose::{implements, Injectable, ServiceCollection, ServiceCollectionExt};
//!
//! trait Greeting: Send + Sync {
//!     fn get(&self) -> String;
//! }
//!
//! struct Hello;
//!
//! impl Injectable for Hello {
//!     type Dependencies = ();
//!     fn inject((): Self::Dependencies) -> Self {
//!         Hello
//!     }
//! }
//!
//! impl Greeting for Hello {
//!     fn get(&self) -> String {
//!         "Hello".to_string()
//!     }
//! }
//!
//! struct Loud {
//!     inner: Arc<dyn Greeting>,
//! }
//!
//! impl Injectable for Loud {
//!     type Dependencies = (Arc<dyn Greeting>,);
//!     fn inject((inner,): Self::Dependencies) -> Self {
//!         Loud { inner }
//!     }
//! }
//!
//! impl Greeting for Loud {
//!     fn get(&self) -> String {
//!         format!("{}!", self.inner.get())
//!     }
//! }
//!
//! implements!(Hello => dyn Greeting, Loud => dyn Greeting);
//!
//! let provider = ServiceCollection::new()
//!     .add_singleton::<dyn Greeting, Hello>()
//!     .decorate::<dyn Greeting, Loud>()?
//!     .decorate::<dyn Greeting, Loud>()?
//!     .build();
//!
//! assert_eq!(provider.resolve::<dyn Greeting>()?.get(), "Hello!!");
//! # Ok::<(), di_compose::ContainerError>(())
//! ```

pub mod compose;
pub mod config;
pub mod container;
pub mod error;
pub mod logging;
mod macros;

pub use compose::ServiceCollectionExt;
pub use config::ProviderOptions;
pub use container::{
    ContainerStats, Implements, Injectable, Resolver, ServiceCollection, ServiceDescriptor,
    ServiceLifetime, ServiceProvider, ServiceScope, Upcast,
};
pub use error::ContainerError;
