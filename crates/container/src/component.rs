//! Идентичность компонентов: ключи, квалификаторы и ссылки на зависимости.
//!
//! `ComponentKey` — то, под чем биндинг лежит в реестре (тип + опциональный
//! квалификатор). `ComponentRef` — то, как компонент запрашивает зависимость
//! (ключ + вид контейнера: прямое значение или отложенный Provider).

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Разрешённый экземпляр компонента.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Тег-маркер, заменяющий аннотационные метаданные.
///
/// Квалификаторность задаётся явным флагом при создании тега, а не
/// рефлексией: биндинг с тегом, у которого флаг не выставлен, отклоняется
/// как `IllegalComponent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    name: &'static str,
    value: Option<String>,
    qualifier: bool,
}

impl Tag {
    /// Именованный квалификатор (аналог `@Named("...")`).
    pub fn named(value: impl Into<String>) -> Self {
        Self {
            name: "Named",
            value: Some(value.into()),
            qualifier: true,
        }
    }

    /// Квалификатор-маркер без значения.
    pub fn qualifier(name: &'static str) -> Self {
        Self {
            name,
            value: None,
            qualifier: true,
        }
    }

    /// Тег, не являющийся квалификатором. Использование его при биндинге
    /// приводит к `IllegalComponent`.
    pub fn plain(name: &'static str) -> Self {
        Self {
            name,
            value: None,
            qualifier: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_qualifier(&self) -> bool {
        self.qualifier
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}(\"{}\")", self.name, value),
            None => write!(f, "@{}", self.name),
        }
    }
}

/// Ключ биндинга: тип компонента плюс опциональный квалификатор.
///
/// Имя типа хранится только для диагностики и не участвует в
/// сравнении/хэшировании.
#[derive(Debug, Clone)]
pub struct ComponentKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<Tag>,
}

impl ComponentKey {
    /// Ключ по типу без квалификатора. Тип может быть маркером (`?Sized`).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// Ключ по типу с квалификатором.
    pub fn qualified<T: ?Sized + 'static>(qualifier: Tag) -> Self {
        Self::of::<T>().with_qualifier(qualifier)
    }

    pub fn with_qualifier(mut self, qualifier: Tag) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn qualifier(&self) -> Option<&Tag> {
        self.qualifier.as_ref()
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} {}", self.type_name, qualifier),
            None => f.write_str(self.type_name),
        }
    }
}

/// Вид контейнера-обёртки, в котором запрашивается зависимость.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Прямое значение.
    Direct,
    /// Отложенная фабрика: зависимость разрешается при обращении, а не при
    /// конструировании. Единственный санкционированный способ разорвать цикл.
    Provider,
    /// Любой другой контейнерный тип — контекст его не разрешает.
    Other(&'static str),
}

/// Ссылка на зависимость: ключ плюс вид контейнера.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    key: ComponentKey,
    container: ContainerKind,
}

impl ComponentRef {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: ComponentKey::of::<T>(),
            container: ContainerKind::Direct,
        }
    }

    pub fn qualified<T: ?Sized + 'static>(qualifier: Tag) -> Self {
        Self {
            key: ComponentKey::qualified::<T>(qualifier),
            container: ContainerKind::Direct,
        }
    }

    pub fn provider<T: ?Sized + 'static>() -> Self {
        Self {
            key: ComponentKey::of::<T>(),
            container: ContainerKind::Provider,
        }
    }

    pub fn qualified_provider<T: ?Sized + 'static>(qualifier: Tag) -> Self {
        Self {
            key: ComponentKey::qualified::<T>(qualifier),
            container: ContainerKind::Provider,
        }
    }

    /// Ссылка в неподдерживаемом контейнере (например `Vec<T>`).
    pub fn other<T: ?Sized + 'static>(container: &'static str) -> Self {
        Self {
            key: ComponentKey::of::<T>(),
            container: ContainerKind::Other(container),
        }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub fn container(&self) -> ContainerKind {
        self.container
    }

    pub fn is_provider(&self) -> bool {
        self.container == ContainerKind::Provider
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container {
            ContainerKind::Direct => write!(f, "{}", self.key),
            ContainerKind::Provider => write!(f, "Provider<{}>", self.key),
            ContainerKind::Other(container) => write!(f, "{}<{}>", container, self.key),
        }
    }
}
