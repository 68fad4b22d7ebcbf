//! Реестр биндингов: мутабельная фаза конфигурации.
//!
//! `ContextConfig` накапливает биндинги (готовые экземпляры и дескрипторы
//! классов), а `get_context` замораживает реестр: строит граф зависимостей,
//! валидирует его и отдаёт неизменяемый [`Context`]. После этого ошибки
//! разрешения невозможны.
//!
//! Повторный биндинг того же ключа перезаписывает предыдущий. Порядок первых
//! вставок сохраняется, чтобы валидация и диагностика были детерминированными.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::component::{ComponentKey, ComponentRef, Instance, Tag};
use crate::context::Context;
use crate::dependency_graph_validator::DependencyGraph;
use crate::descriptor::ClassDescriptor;
use crate::errors::ContainerError;
use crate::injection::InjectionProvider;

pub(crate) enum Binding {
    /// Готовый экземпляр: один и тот же объект на каждое разрешение.
    Instance(Instance),
    /// План инъекции: свежий экземпляр на каждое разрешение.
    Class(Arc<InjectionProvider>),
}

impl Binding {
    fn dependencies(&self) -> &[ComponentRef] {
        match self {
            Binding::Instance(_) => &[],
            Binding::Class(provider) => provider.dependencies(),
        }
    }
}

/// Мутабельный реестр биндингов.
#[derive(Default)]
pub struct ContextConfig {
    bindings: HashMap<ComponentKey, Binding>,
    order: Vec<ComponentKey>,
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Привязать готовый экземпляр к типу `S` без квалификатора.
    pub fn bind_instance<S, T>(&mut self, instance: Arc<T>)
    where
        S: ?Sized + 'static,
        T: Any + Send + Sync,
    {
        self.insert(ComponentKey::of::<S>(), Binding::Instance(instance));
    }

    /// Привязать готовый экземпляр к типу `S` под каждым из квалификаторов.
    /// Тег без квалификаторного флага — `IllegalComponent`.
    pub fn bind_qualified_instance<S, T>(
        &mut self,
        instance: Arc<T>,
        qualifiers: &[Tag],
    ) -> Result<(), ContainerError>
    where
        S: ?Sized + 'static,
        T: Any + Send + Sync,
    {
        check_qualifiers::<S>(qualifiers)?;
        for qualifier in qualifiers {
            let value: Instance = Arc::clone(&instance) as Instance;
            self.insert(
                ComponentKey::qualified::<S>(qualifier.clone()),
                Binding::Instance(value),
            );
        }
        Ok(())
    }

    /// Привязать тип-реализацию к типу `S` без квалификатора. Нелегальная
    /// форма компонента отклоняется здесь же, синхронно.
    pub fn bind_component<S: ?Sized + 'static>(
        &mut self,
        descriptor: &Arc<ClassDescriptor>,
    ) -> Result<(), ContainerError> {
        let provider = Arc::new(InjectionProvider::new(descriptor)?);
        self.insert(ComponentKey::of::<S>(), Binding::Class(provider));
        Ok(())
    }

    /// Привязать тип-реализацию к типу `S` под каждым из квалификаторов.
    pub fn bind_qualified_component<S: ?Sized + 'static>(
        &mut self,
        descriptor: &Arc<ClassDescriptor>,
        qualifiers: &[Tag],
    ) -> Result<(), ContainerError> {
        check_qualifiers::<S>(qualifiers)?;
        let provider = Arc::new(InjectionProvider::new(descriptor)?);
        for qualifier in qualifiers {
            self.insert(
                ComponentKey::qualified::<S>(qualifier.clone()),
                Binding::Class(Arc::clone(&provider)),
            );
        }
        Ok(())
    }

    /// Заморозить реестр: провалидировать граф и вернуть контекст.
    pub fn get_context(self) -> Result<Context, ContainerError> {
        let mut graph = DependencyGraph::new();
        for key in &self.order {
            if let Some(binding) = self.bindings.get(key) {
                graph.insert(key.clone(), binding.dependencies().to_vec());
            }
        }
        graph.validate()?;
        debug!(
            components = graph.component_count(),
            dependencies = graph.dependency_count(),
            "✅ контекст собран"
        );
        Ok(Context::new(self.bindings))
    }

    fn insert(&mut self, key: ComponentKey, binding: Binding) {
        debug!(key = %key, "🔗 биндинг зарегистрирован");
        if self.bindings.insert(key.clone(), binding).is_none() {
            self.order.push(key);
        }
    }
}

fn check_qualifiers<S: ?Sized + 'static>(qualifiers: &[Tag]) -> Result<(), ContainerError> {
    for tag in qualifiers {
        if !tag.is_qualifier() {
            return Err(ContainerError::illegal_component(
                std::any::type_name::<S>(),
                format!("tag '{tag}' is not a qualifier"),
            ));
        }
    }
    Ok(())
}
