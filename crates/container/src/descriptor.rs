//! Явная модель компонента, заменяющая рефлексию.
//!
//! `ClassDescriptor` описывает реализацию так, как её видел бы рантайм с
//! интроспекцией: объявленные конструкторы, поля и методы с явными
//! inject-флагами плюс ссылка на родительский уровень иерархии. Дескриптор
//! регистрируется один раз (сгенерированным кодом или вручную в билдере) и
//! дальше используется только для вывода плана инъекции.
//!
//! Аппликаторы членов типизированы по собственному уровню (`Fn(&mut C, ..)`);
//! наследование выражается проекцией `fn(&mut Child) -> &mut Parent` на
//! встроенную родительскую часть экземпляра.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::component::{ComponentRef, ContainerKind};
use crate::context::{Arguments, Resolved};

/// Часть экземпляра, с которой работают аппликаторы уровня.
pub type Part = dyn Any + Send + Sync;

/// Стёртый конструктор: аргументы уже разрешены контекстом.
pub(crate) type ConstructFn = Arc<dyn Fn(&Arguments) -> Option<Box<Part>> + Send + Sync>;
/// Стёртый сеттер inject-поля.
pub(crate) type AssignFn = Arc<dyn Fn(&mut Part, Resolved) -> Option<()> + Send + Sync>;
/// Стёртый вызов inject-метода.
pub(crate) type InvokeFn = Arc<dyn Fn(&mut Part, &Arguments) -> Option<()> + Send + Sync>;

/// Проекция экземпляра на встроенную родительскую часть.
pub(crate) trait ProjectPart: Send + Sync {
    fn project<'a>(&self, part: &'a mut Part) -> Option<&'a mut Part>;
}

pub(crate) type Projection = Arc<dyn ProjectPart>;

struct EmbeddedParent<C, P> {
    project: fn(&mut C) -> &mut P,
}

impl<C, P> ProjectPart for EmbeddedParent<C, P>
where
    C: Any + Send + Sync,
    P: Any + Send + Sync,
{
    fn project<'a>(&self, part: &'a mut Part) -> Option<&'a mut Part> {
        Some((self.project)(part.downcast_mut::<C>()?))
    }
}

/// Вид типа: инстанцировать можно только конкретный.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

pub(crate) struct ConstructorSpec {
    pub(crate) inject: bool,
    pub(crate) params: Vec<ComponentRef>,
    pub(crate) construct: ConstructFn,
}

pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) immutable: bool,
    pub(crate) reference: ComponentRef,
    pub(crate) assign: AssignFn,
}

pub(crate) struct MethodSpec {
    pub(crate) name: &'static str,
    pub(crate) inject: bool,
    pub(crate) type_parameters: usize,
    pub(crate) params: Vec<ComponentRef>,
    pub(crate) invoke: InvokeFn,
}

/// Сигнатура метода для правил подавления переопределений: имя плюс типы
/// параметров. Квалификаторы в сигнатуру не входят.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MethodSignature {
    name: &'static str,
    params: Vec<(TypeId, ContainerKind)>,
}

impl MethodSpec {
    pub(crate) fn signature(&self) -> MethodSignature {
        MethodSignature {
            name: self.name,
            params: self
                .params
                .iter()
                .map(|p| (p.key().type_id(), p.container()))
                .collect(),
        }
    }
}

/// Описание типа-реализации: уровень иерархии со своими членами.
pub struct ClassDescriptor {
    pub(crate) name: &'static str,
    pub(crate) kind: ClassKind,
    pub(crate) parent: Option<(Arc<ClassDescriptor>, Projection)>,
    pub(crate) constructors: Vec<ConstructorSpec>,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) methods: Vec<MethodSpec>,
}

impl ClassDescriptor {
    /// Начать описание конкретного типа `C`.
    pub fn builder<C: Any + Send + Sync>(name: &'static str) -> ClassDescriptorBuilder<C> {
        ClassDescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }
}

/// Типизированный билдер дескриптора.
pub struct ClassDescriptorBuilder<C> {
    name: &'static str,
    kind: ClassKind,
    parent: Option<(Arc<ClassDescriptor>, Projection)>,
    constructors: Vec<ConstructorSpec>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Any + Send + Sync> ClassDescriptorBuilder<C> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            kind: ClassKind::Concrete,
            parent: None,
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Пометить тип как абстрактный или интерфейс.
    pub fn kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    /// Привязать родительский уровень иерархии через проекцию на встроенную
    /// родительскую часть экземпляра.
    pub fn extends<P: Any + Send + Sync>(
        mut self,
        parent: &Arc<ClassDescriptor>,
        project: fn(&mut C) -> &mut P,
    ) -> Self {
        self.parent = Some((Arc::clone(parent), Arc::new(EmbeddedParent { project })));
        self
    }

    /// Объявить inject-конструктор.
    pub fn inject_constructor<F>(mut self, params: Vec<ComponentRef>, construct: F) -> Self
    where
        F: Fn(&Arguments) -> Option<C> + Send + Sync + 'static,
    {
        let construct: ConstructFn =
            Arc::new(move |args| Some(Box::new(construct(args)?) as Box<Part>));
        self.constructors.push(ConstructorSpec {
            inject: true,
            params,
            construct,
        });
        self
    }

    /// Объявить конструктор по умолчанию (без аргументов, без inject).
    pub fn default_constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        let construct: ConstructFn = Arc::new(move |_| Some(Box::new(construct()) as Box<Part>));
        self.constructors.push(ConstructorSpec {
            inject: false,
            params: Vec::new(),
            construct,
        });
        self
    }

    /// Объявить inject-поле с сеттером.
    pub fn inject_field<F>(
        mut self,
        name: &'static str,
        reference: ComponentRef,
        assign: F,
    ) -> Self
    where
        F: Fn(&mut C, Resolved) -> Option<()> + Send + Sync + 'static,
    {
        let assign: AssignFn =
            Arc::new(move |part, value| assign(part.downcast_mut::<C>()?, value));
        self.fields.push(FieldSpec {
            name,
            immutable: false,
            reference,
            assign,
        });
        self
    }

    /// Объявить immutable inject-поле: переписать его нельзя, такой
    /// дескриптор отклоняется при выводе плана.
    pub fn immutable_inject_field(mut self, name: &'static str, reference: ComponentRef) -> Self {
        self.fields.push(FieldSpec {
            name,
            immutable: true,
            reference,
            assign: Arc::new(|_, _| None),
        });
        self
    }

    /// Объявить inject-метод.
    pub fn inject_method<F>(
        mut self,
        name: &'static str,
        params: Vec<ComponentRef>,
        invoke: F,
    ) -> Self
    where
        F: Fn(&mut C, &Arguments) -> Option<()> + Send + Sync + 'static,
    {
        let invoke: InvokeFn = Arc::new(move |part, args| invoke(part.downcast_mut::<C>()?, args));
        self.methods.push(MethodSpec {
            name,
            inject: true,
            type_parameters: 0,
            params,
            invoke,
        });
        self
    }

    /// Объявить обычный (не-inject) метод. Сам по себе он не участвует в
    /// инъекции, но его сигнатура подавляет одноимённые inject-методы
    /// суперклассов.
    pub fn method(mut self, name: &'static str, params: Vec<ComponentRef>) -> Self {
        self.methods.push(MethodSpec {
            name,
            inject: false,
            type_parameters: 0,
            params,
            invoke: Arc::new(|_, _| Some(())),
        });
        self
    }

    /// Объявить inject-метод с собственными type parameters — такой
    /// дескриптор отклоняется при выводе плана.
    pub fn generic_inject_method(mut self, name: &'static str) -> Self {
        self.methods.push(MethodSpec {
            name,
            inject: true,
            type_parameters: 1,
            params: Vec::new(),
            invoke: Arc::new(|_, _| Some(())),
        });
        self
    }

    pub fn build(self) -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor {
            name: self.name,
            kind: self.kind,
            parent: self.parent,
            constructors: self.constructors,
            fields: self.fields,
            methods: self.methods,
        })
    }
}
