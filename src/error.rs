//! 容器错误类型
//!
//! 组合期错误（`NotRegistered` / `AmbiguousRegistration`）在 `decorate` 调用时立即返回；
//! 构造期错误只在解析被装饰的契约时出现。

use std::any::type_name;
use std::error::Error;
use std::fmt;

use tracing::{debug, error, warn};

/// 依赖注入容器错误
#[derive(Debug)]
pub enum ContainerError {
    /// 契约没有任何注册
    NotRegistered { service_type: &'static str },
    /// 契约有多个注册，无法确定要装饰哪一个
    AmbiguousRegistration {
        service_type: &'static str,
        count: usize,
    },
    /// 实现类型的构造函数无法接受给定的参数
    NoSuitableConstructor {
        implementation: &'static str,
        reason: String,
    },
    /// 循环依赖，`chain` 为从根到重复点的解析路径
    CircularDependency { chain: Vec<&'static str> },
    /// 工厂函数返回了自定义错误
    CreationFailed {
        service_type: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    /// 类型擦除后的实例与契约不符
    TypeCastFailed { expected: &'static str },
    /// 作用域服务的使用违反了作用域规则
    ScopeViolation {
        service_type: &'static str,
        reason: String,
    },
    /// 配置加载失败
    Config(String),
}

impl ContainerError {
    /// 包装工厂函数中的自定义错误
    pub fn creation_failed<C: ?Sized>(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        ContainerError::CreationFailed {
            service_type: type_name::<C>(),
            source: source.into(),
        }
    }

    pub(crate) fn type_cast<C: ?Sized>() -> Self {
        ContainerError::TypeCastFailed {
            expected: type_name::<C>(),
        }
    }

    /// 注册表本身有问题：契约没有注册或注册不唯一
    ///
    /// 只描述错误的性质，不区分发生时机。`decorate` 在组合期返回这类错误，
    /// 解析时发现装饰器的其它依赖缺失也同样是 `NotRegistered`。
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            ContainerError::NotRegistered { .. } | ContainerError::AmbiguousRegistration { .. }
        )
    }

    /// 记录错误到日志
    pub fn log(&self) {
        match self {
            ContainerError::CircularDependency { .. } | ContainerError::TypeCastFailed { .. } => {
                error!("{}", self);
            }
            ContainerError::Config(_) => {
                debug!("{}", self);
            }
            _ => {
                warn!("{}", self);
            }
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::NotRegistered { service_type } => {
                write!(f, "{} is not registered", service_type)
            }
            ContainerError::AmbiguousRegistration {
                service_type,
                count,
            } => {
                write!(
                    f,
                    "{} has {} registrations, expected exactly one",
                    service_type, count
                )
            }
            ContainerError::NoSuitableConstructor {
                implementation,
                reason,
            } => {
                write!(
                    f,
                    "No suitable constructor for '{}': {}",
                    implementation, reason
                )
            }
            ContainerError::CircularDependency { chain } => {
                write!(f, "Circular dependency detected: {}", chain.join(" -> "))
            }
            ContainerError::CreationFailed {
                service_type,
                source,
            } => {
                write!(f, "Failed to create service '{}': {}", service_type, source)
            }
            ContainerError::TypeCastFailed { expected } => {
                write!(f, "Type cast failed: expected '{}'", expected)
            }
            ContainerError::ScopeViolation {
                service_type,
                reason,
            } => {
                write!(f, "Scope violation for '{}': {}", service_type, reason)
            }
            ContainerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for ContainerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ContainerError::CreationFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_names_the_contract() {
        let error = ContainerError::NotRegistered {
            service_type: "InterfaceB",
        };
        assert_eq!(error.to_string(), "InterfaceB is not registered");
        assert!(error.is_registration_error());
    }

    #[test]
    fn test_circular_dependency_display() {
        let error = ContainerError::CircularDependency {
            chain: vec!["A", "B", "A"],
        };
        assert_eq!(error.to_string(), "Circular dependency detected: A -> B -> A");
        assert!(!error.is_registration_error());
    }

    #[test]
    fn test_creation_failed_keeps_source() {
        let error = ContainerError::creation_failed::<String>("disk full");

        assert!(error.to_string().contains("alloc::string::String"));
        assert_eq!(error.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_ambiguous_display_includes_count() {
        let error = ContainerError::AmbiguousRegistration {
            service_type: "InterfaceB",
            count: 2,
        };
        assert!(error.to_string().contains("2 registrations"));
    }
}
