//! Неизменяемый контекст разрешения.
//!
//! `Context` возвращается только после успешной валидации графа, поэтому
//! разрешение через него никогда не ошибается: незарегистрированный ключ или
//! неподдерживаемый контейнер дают `None`, всё остальное гарантировано
//! существует. Внутреннее состояние разделяется через `Arc` и не мутирует,
//! так что параллельное read-only разрешение безопасно.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::component::{ComponentKey, ComponentRef, ContainerKind, Instance};
use crate::registry::Binding;

/// Результат разрешения: значение или отложенная фабрика.
pub enum Resolved {
    Instance(Instance),
    Provider(ComponentProvider),
}

impl Resolved {
    /// Типизированный доступ к значению. `None`, если это provider или
    /// фактический тип не совпадает.
    pub fn instance<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Resolved::Instance(value) => Arc::clone(value).downcast::<T>().ok(),
            Resolved::Provider(_) => None,
        }
    }

    /// Нетипизированное значение.
    pub fn raw(&self) -> Option<Instance> {
        match self {
            Resolved::Instance(value) => Some(Arc::clone(value)),
            Resolved::Provider(_) => None,
        }
    }

    /// Типизированная отложенная фабрика.
    pub fn lazy<T: Any + Send + Sync>(&self) -> Option<Lazy<T>> {
        match self {
            Resolved::Provider(provider) => Some(Lazy {
                provider: provider.clone(),
                _marker: PhantomData,
            }),
            Resolved::Instance(_) => None,
        }
    }

    /// Нетипизированная отложенная фабрика.
    pub fn provider(&self) -> Option<ComponentProvider> {
        match self {
            Resolved::Provider(provider) => Some(provider.clone()),
            Resolved::Instance(_) => None,
        }
    }
}

/// Отложенная фабрика компонента: разрешает ключ при каждом вызове `get`.
/// Захватывает контекст целиком, поэтому переживает цикл в графе —
/// разрешение происходит уже после конструирования владельца.
#[derive(Clone)]
pub struct ComponentProvider {
    context: Context,
    key: ComponentKey,
}

impl ComponentProvider {
    pub fn get(&self) -> Option<Instance> {
        self.context.instantiate(&self.key)
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }
}

/// Типизированная обёртка над [`ComponentProvider`].
pub struct Lazy<T: ?Sized> {
    provider: ComponentProvider,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Lazy<T> {
    pub fn get(&self) -> Option<Arc<T>> {
        self.provider.get()?.downcast::<T>().ok()
    }
}

impl<T: ?Sized> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            _marker: PhantomData,
        }
    }
}

/// Разрешённые аргументы конструктора или метода, в порядке объявления.
pub struct Arguments(pub(crate) Vec<Resolved>);

impl Arguments {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Resolved> {
        self.0.get(index)
    }

    pub fn instance<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        self.0.get(index)?.instance()
    }

    pub fn lazy<T: Any + Send + Sync>(&self, index: usize) -> Option<Lazy<T>> {
        self.0.get(index)?.lazy()
    }
}

struct ContextInner {
    bindings: HashMap<ComponentKey, Binding>,
}

/// Неизменяемый резолвер поверх замороженного реестра.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("bindings", &self.inner.bindings.len())
            .finish_non_exhaustive()
    }
}

impl Context {
    pub(crate) fn new(bindings: HashMap<ComponentKey, Binding>) -> Self {
        Self {
            inner: Arc::new(ContextInner { bindings }),
        }
    }

    /// Разрешить ссылку на компонент.
    ///
    /// Прямая ссылка даёт значение (instance-биндинг — всегда один и тот же
    /// объект, class-биндинг — свежий экземпляр на каждый вызов). Ссылка в
    /// `Provider` даёт отложенную фабрику. Любой другой вид контейнера не
    /// поддерживается и даёт `None`.
    pub fn get(&self, reference: &ComponentRef) -> Option<Resolved> {
        match reference.container() {
            ContainerKind::Direct => {
                Some(Resolved::Instance(self.instantiate(reference.key())?))
            }
            ContainerKind::Provider => {
                if !self.inner.bindings.contains_key(reference.key()) {
                    return None;
                }
                Some(Resolved::Provider(ComponentProvider {
                    context: self.clone(),
                    key: reference.key().clone(),
                }))
            }
            ContainerKind::Other(container) => {
                debug!(container, key = %reference.key(), "unsupported container kind");
                None
            }
        }
    }

    /// Разрешить неквалифицированный ключ типа `T` и привести к `T`.
    pub fn get_instance<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get(&ComponentRef::of::<T>())?.instance::<T>()
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.inner.bindings.contains_key(key)
    }

    fn instantiate(&self, key: &ComponentKey) -> Option<Instance> {
        match self.inner.bindings.get(key)? {
            Binding::Instance(value) => Some(Arc::clone(value)),
            Binding::Class(provider) => provider.provide(self),
        }
    }

    pub(crate) fn resolve_all(&self, references: &[ComponentRef]) -> Option<Arguments> {
        references
            .iter()
            .map(|reference| self.get(reference))
            .collect::<Option<Vec<_>>>()
            .map(Arguments)
    }
}
