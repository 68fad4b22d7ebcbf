//! Вывод плана инъекции из дескриптора и фабрика экземпляров.
//!
//! `InjectionProvider::new` проверяет форму компонента и строит план:
//! выбранный конструктор, inject-поля (включая унаследованные) и
//! inject-методы (с подавлением переопределений, суперклассы первыми).
//! Все ошибки формы поднимаются здесь же, синхронно из `bind`, а не из
//! `get_context`. Список зависимостей вычисляется один раз и дальше
//! неизменен.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::component::{ComponentRef, Instance};
use crate::context::Context;
use crate::descriptor::{
    AssignFn, ClassDescriptor, ClassKind, ConstructFn, InvokeFn, MethodSignature, Part, Projection,
};
use crate::errors::ContainerError;

struct PlannedConstructor {
    params: Vec<ComponentRef>,
    construct: ConstructFn,
}

struct PlannedField {
    reference: ComponentRef,
    assign: AssignFn,
    chain: Vec<Projection>,
}

struct PlannedMethod {
    params: Vec<ComponentRef>,
    invoke: InvokeFn,
    chain: Vec<Projection>,
}

/// План инъекции для одного типа-реализации.
pub struct InjectionProvider {
    component: &'static str,
    constructor: PlannedConstructor,
    fields: Vec<PlannedField>,
    methods: Vec<PlannedMethod>,
    dependencies: Vec<ComponentRef>,
}

impl fmt::Debug for InjectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionProvider")
            .field("component", &self.component)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl InjectionProvider {
    /// Вывести план из дескриптора. Любая нелегальная форма компонента —
    /// `IllegalComponent`.
    pub fn new(descriptor: &Arc<ClassDescriptor>) -> Result<Self, ContainerError> {
        match descriptor.kind {
            ClassKind::Concrete => {}
            ClassKind::Abstract => {
                return Err(ContainerError::illegal_component(
                    descriptor.name,
                    "abstract component cannot be instantiated",
                ));
            }
            ClassKind::Interface => {
                return Err(ContainerError::illegal_component(
                    descriptor.name,
                    "interface cannot be instantiated",
                ));
            }
        }

        let constructor = select_constructor(descriptor)?;
        let fields = collect_fields(descriptor)?;
        let methods = collect_methods(descriptor)?;

        let mut dependencies = constructor.params.clone();
        dependencies.extend(fields.iter().map(|f| f.reference.clone()));
        dependencies.extend(methods.iter().flat_map(|m| m.params.iter().cloned()));

        debug!(
            component = descriptor.name,
            fields = fields.len(),
            methods = methods.len(),
            dependencies = dependencies.len(),
            "построен план инъекции"
        );

        Ok(Self {
            component: descriptor.name,
            constructor,
            fields,
            methods,
            dependencies,
        })
    }

    pub fn component_name(&self) -> &'static str {
        self.component
    }

    /// Все ссылки на зависимости в фиксированном порядке: параметры
    /// конструктора, поля, параметры методов.
    pub fn dependencies(&self) -> &[ComponentRef] {
        &self.dependencies
    }

    /// Собрать экземпляр: конструктор, затем поля, затем методы. Аргументы
    /// разрешаются через контекст; на валидированном графе `None`
    /// недостижим для прямых ссылок.
    pub fn provide(&self, context: &Context) -> Option<Instance> {
        let args = context.resolve_all(&self.constructor.params)?;
        let mut instance = (self.constructor.construct)(&args)?;

        for field in &self.fields {
            let value = context.get(&field.reference)?;
            let part = locate(instance.as_mut(), &field.chain)?;
            (field.assign)(part, value)?;
        }

        for method in &self.methods {
            let args = context.resolve_all(&method.params)?;
            let part = locate(instance.as_mut(), &method.chain)?;
            (method.invoke)(part, &args)?;
        }

        Some(Arc::from(instance))
    }
}

/// Спроецировать экземпляр на часть нужного уровня иерархии.
fn locate<'a>(mut part: &'a mut Part, chain: &[Projection]) -> Option<&'a mut Part> {
    for projection in chain {
        part = projection.project(part)?;
    }
    Some(part)
}

/// Уровни иерархии от самого производного вверх, с цепочкой проекций от
/// корневого экземпляра к каждому уровню.
fn levels(descriptor: &Arc<ClassDescriptor>) -> Vec<(Arc<ClassDescriptor>, Vec<Projection>)> {
    let mut out = vec![(Arc::clone(descriptor), Vec::new())];
    let mut chain: Vec<Projection> = Vec::new();
    let mut current = Arc::clone(descriptor);
    while let Some((parent, projection)) = current.parent.clone() {
        chain.push(projection);
        out.push((Arc::clone(&parent), chain.clone()));
        current = parent;
    }
    out
}

/// Выбор конструктора: ровно один inject-конструктор, иначе объявленный
/// конструктор по умолчанию, иначе ошибка.
fn select_constructor(
    descriptor: &Arc<ClassDescriptor>,
) -> Result<PlannedConstructor, ContainerError> {
    let inject: Vec<_> = descriptor.constructors.iter().filter(|c| c.inject).collect();
    if inject.len() > 1 {
        return Err(ContainerError::illegal_component(
            descriptor.name,
            "more than one inject constructor declared",
        ));
    }
    let selected = match inject.first() {
        Some(constructor) => *constructor,
        None => descriptor
            .constructors
            .iter()
            .find(|c| !c.inject && c.params.is_empty())
            .ok_or_else(|| {
                ContainerError::illegal_component(
                    descriptor.name,
                    "no inject constructor nor default constructor declared",
                )
            })?,
    };
    Ok(PlannedConstructor {
        params: selected.params.clone(),
        construct: Arc::clone(&selected.construct),
    })
}

/// Сбор inject-полей по всей иерархии, от производного уровня вверх.
/// Immutable inject-поле — нелегальная форма.
fn collect_fields(descriptor: &Arc<ClassDescriptor>) -> Result<Vec<PlannedField>, ContainerError> {
    let mut planned = Vec::new();
    for (level, chain) in levels(descriptor) {
        for field in &level.fields {
            if field.immutable {
                return Err(ContainerError::illegal_component(
                    descriptor.name,
                    format!("inject field '{}' is immutable", field.name),
                ));
            }
            planned.push(PlannedField {
                reference: field.reference.clone(),
                assign: Arc::clone(&field.assign),
                chain: chain.clone(),
            });
        }
    }
    Ok(planned)
}

/// Сбор inject-методов с двумя правилами подавления:
/// сигнатура, уже собранная на более производном уровне, и сигнатура,
/// которую самый производный тип объявляет без inject. После фильтрации
/// порядок разворачивается: методы суперклассов выполняются первыми.
fn collect_methods(
    descriptor: &Arc<ClassDescriptor>,
) -> Result<Vec<PlannedMethod>, ContainerError> {
    let suppressed: HashSet<MethodSignature> = descriptor
        .methods
        .iter()
        .filter(|m| !m.inject)
        .map(|m| m.signature())
        .collect();

    let mut seen: HashSet<MethodSignature> = HashSet::new();
    let mut planned = Vec::new();
    for (level, chain) in levels(descriptor) {
        for method in level.methods.iter().filter(|m| m.inject) {
            let signature = method.signature();
            if suppressed.contains(&signature) || !seen.insert(signature) {
                continue;
            }
            if method.type_parameters != 0 {
                return Err(ContainerError::illegal_component(
                    descriptor.name,
                    format!("inject method '{}' declares type parameters", method.name),
                ));
            }
            planned.push(PlannedMethod {
                params: method.params.clone(),
                invoke: Arc::clone(&method.invoke),
                chain: chain.clone(),
            });
        }
    }
    planned.reverse();
    Ok(planned)
}
