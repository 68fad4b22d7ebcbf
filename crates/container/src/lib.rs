mod component;
mod context;
mod dependency_graph_validator;
mod descriptor;
mod errors;
mod injection;
mod registry;

// Идентичность компонентов
pub use component::{ComponentKey, ComponentRef, ContainerKind, Instance, Tag};

// Фаза конфигурации
pub use descriptor::{ClassDescriptor, ClassDescriptorBuilder, ClassKind};
pub use injection::InjectionProvider;
pub use registry::ContextConfig;

// Фаза разрешения
pub use context::{Arguments, ComponentProvider, Context, Lazy, Resolved};

// Валидация графа и ошибки
pub use dependency_graph_validator::DependencyGraph;
pub use errors::ContainerError;
