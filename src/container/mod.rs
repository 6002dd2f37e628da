//! Host container
//!
//! 组合层依赖的最小宿主容器：
//! - 有序的注册表构建器（`ServiceCollection`）
//! - 不可变的解析器（`ServiceProvider` / `ServiceScope`）
//! - 编译期构造函数元数据（`Injectable` / `Dependencies`）
//! - 循环依赖检测

pub mod activator;
pub mod collection;
pub mod descriptor;
pub mod provider;
pub mod resolver;
pub mod stats;

use std::fmt;

pub use activator::{
    construct, Contract, Dependencies, Dependency, Implements, Injectable, Parameter,
    ParameterKind, Substitutions, Upcast,
};
pub use collection::ServiceCollection;
pub use descriptor::{
    downcast, erase, factory_fn, factory_fn_for, ErasedInstance, FactoryFn, ImplementationType,
    Materialization, ServiceDescriptor,
};
pub use provider::{ServiceProvider, ServiceScope};
pub use resolver::Resolver;
pub use stats::ContainerStats;

// Lifecycle enum kept at container module level so every submodule can reference it via `super::ServiceLifetime`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// Single instance for the entire provider lifetime
    Singleton,
    /// Per-scope instance (shared within one scope)
    Scoped,
    /// New instance per resolve
    Transient,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceLifetime::Singleton => "singleton",
            ServiceLifetime::Scoped => "scoped",
            ServiceLifetime::Transient => "transient",
        };
        f.write_str(name)
    }
}
