//! 组合扩展
//!
//! 在宿主容器之上补充两种组合能力：
//! - 别名：把已注册的实现再以另一个契约暴露，不构造第二个实例
//! - 装饰：用新的实现包裹契约现有的注册，被包裹的实例作为新实现的构造参数
//!
//! 两者都只在构建阶段操作注册描述符，实际的实例化仍交给宿主容器。

mod alias;
mod decorate;

pub use alias::alias_descriptor;
pub use decorate::{decorate_descriptor, materialize};

use std::any::{type_name, TypeId};

use tracing::debug;

use crate::container::{Contract, Implements, ServiceCollection, Upcast};
use crate::error::ContainerError;

/// `ServiceCollection` 的组合扩展方法
pub trait ServiceCollectionExt: Sized {
    /// 以契约 `C` 暴露已注册的实现 `I`
    ///
    /// 新注册为单例工厂，解析时向容器请求 `I`；实例是否共享取决于 `I` 自己的生命周期。
    /// 不检查 `C` 是否已有注册。
    fn alias<C, I>(self) -> Self
    where
        C: ?Sized + Contract,
        I: ?Sized + Upcast<C>;

    /// 用 `D` 装饰契约 `C` 当前唯一的注册
    ///
    /// 原注册的生命周期保持不变。多次调用逐层叠加，最先注册的实现位于最内层。
    fn decorate<C, D>(self) -> Result<Self, ContainerError>
    where
        C: ?Sized + Contract,
        D: Implements<C>;
}

impl ServiceCollectionExt for ServiceCollection {
    fn alias<C, I>(self) -> Self
    where
        C: ?Sized + Contract,
        I: ?Sized + Upcast<C>,
    {
        debug!(
            contract = type_name::<C>(),
            implementation = type_name::<I>(),
            "Alias registered"
        );
        self.add_descriptor(alias_descriptor::<C, I>())
    }

    fn decorate<C, D>(self) -> Result<Self, ContainerError>
    where
        C: ?Sized + Contract,
        D: Implements<C>,
    {
        let original = self
            .find_single(TypeId::of::<C>(), type_name::<C>())?
            .clone();

        debug!(
            contract = type_name::<C>(),
            decorator = type_name::<D>(),
            lifetime = %original.lifetime(),
            wrapped = original.materialization().kind(),
            "Decorating service"
        );

        Ok(self.replace(decorate_descriptor::<C, D>(original)))
    }
}
