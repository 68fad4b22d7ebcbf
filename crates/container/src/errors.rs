//! Ошибки движка биндингов.
//!
//! Все три вида ошибок — синхронные ошибки конфигурации, без retry:
//! `IllegalComponent` поднимается на этапе `bind`, `DependencyNotFound` и
//! `CyclicDependency` — на этапе `get_context`. Разрешение через валидный
//! `Context` ошибок не порождает.

use thiserror::Error;

use crate::component::ComponentKey;

/// Основной error type движка.
#[derive(Debug, Error, Clone)]
pub enum ContainerError {
    /// Форма компонента не даёт валидного дескриптора: abstract/interface,
    /// ноль или больше одного inject-конструктора без fallback, immutable
    /// inject-поле, generic inject-метод, не-квалификатор в роли
    /// квалификатора.
    #[error("Illegal component '{component}': {reason}")]
    IllegalComponent { component: String, reason: String },

    /// Объявленная зависимость не имеет биндинга.
    #[error("Dependency not found: '{component}' requires '{dependency}'")]
    DependencyNotFound {
        component: ComponentKey,
        dependency: ComponentKey,
    },

    /// Прямая цепочка зависимостей замкнулась. Несёт полный набор
    /// различных ключей цикла.
    #[error("Cyclic dependencies found: {}", join_keys(.components))]
    CyclicDependency { components: Vec<ComponentKey> },
}

fn join_keys(keys: &[ComponentKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ContainerError {
    pub fn illegal_component(component: impl Into<String>, reason: impl Into<String>) -> Self {
        ContainerError::IllegalComponent {
            component: component.into(),
            reason: reason.into(),
        }
    }

    pub fn dependency_not_found(component: ComponentKey, dependency: ComponentKey) -> Self {
        ContainerError::DependencyNotFound {
            component,
            dependency,
        }
    }

    pub fn cyclic_dependency(components: Vec<ComponentKey>) -> Self {
        ContainerError::CyclicDependency { components }
    }

    /// Категория ошибки для диагностики и логов.
    pub fn category(&self) -> &'static str {
        match self {
            ContainerError::IllegalComponent { .. } => "component",
            ContainerError::DependencyNotFound { .. } => "resolution",
            ContainerError::CyclicDependency { .. } => "cycle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ServiceA;
    struct ServiceB;

    #[test]
    fn test_error_creation() {
        let error = ContainerError::illegal_component("ServiceA", "component is abstract");
        assert_eq!(error.category(), "component");
        assert!(error.to_string().contains("ServiceA"));
        assert!(error.to_string().contains("abstract"));
    }

    #[test]
    fn test_dependency_not_found_display() {
        let error = ContainerError::dependency_not_found(
            ComponentKey::of::<ServiceA>(),
            ComponentKey::of::<ServiceB>(),
        );
        assert_eq!(error.category(), "resolution");
        assert!(error.to_string().contains("ServiceA"));
        assert!(error.to_string().contains("ServiceB"));
    }

    #[test]
    fn test_cycle_display_joins_keys() {
        let error = ContainerError::cyclic_dependency(vec![
            ComponentKey::of::<ServiceA>(),
            ComponentKey::of::<ServiceB>(),
        ]);
        assert_eq!(error.category(), "cycle");
        assert!(error.to_string().contains(" -> "));
    }
}
