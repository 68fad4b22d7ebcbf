//! Интеграционные тесты фаз bind / get_context / разрешение.

use std::sync::Arc;

use rstest::rstest;

use container::{
    ClassDescriptor, ComponentKey, ComponentRef, ContainerError, ContextConfig, Lazy, Tag,
};

trait Greeter: Send + Sync {
    fn greet(&self) -> &'static str;
}

struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

#[derive(Default)]
struct Dependency;

struct Consumer {
    dependency: Option<Arc<Dependency>>,
}

fn consumer_with_constructor() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Consumer>("Consumer")
        .inject_constructor(vec![ComponentRef::of::<Dependency>()], |args| {
            Some(Consumer {
                dependency: Some(args.instance::<Dependency>(0)?),
            })
        })
        .build()
}

fn consumer_with_field() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Consumer>("Consumer")
        .default_constructor(|| Consumer { dependency: None })
        .inject_field("dependency", ComponentRef::of::<Dependency>(), |c, value| {
            c.dependency = Some(value.instance::<Dependency>()?);
            Some(())
        })
        .build()
}

fn consumer_with_method() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Consumer>("Consumer")
        .default_constructor(|| Consumer { dependency: None })
        .inject_method("install", vec![ComponentRef::of::<Dependency>()], |c, args| {
            c.dependency = Some(args.instance::<Dependency>(0)?);
            Some(())
        })
        .build()
}

#[test]
fn test_instance_binding_resolves_to_same_object() {
    let dependency = Arc::new(Dependency);
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(Arc::clone(&dependency));

    let context = config.get_context().unwrap();
    let resolved = context.get_instance::<Dependency>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &dependency));
}

#[test]
fn test_unbound_key_resolves_to_none() {
    let config = ContextConfig::new();
    let context = config.get_context().unwrap();
    assert!(context.get_instance::<Dependency>().is_none());
}

#[rstest]
#[case::constructor(consumer_with_constructor())]
#[case::field(consumer_with_field())]
#[case::method(consumer_with_method())]
fn test_class_binding_injects_dependency(#[case] descriptor: Arc<ClassDescriptor>) {
    let dependency = Arc::new(Dependency);
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(Arc::clone(&dependency));
    config.bind_component::<Consumer>(&descriptor).unwrap();

    let context = config.get_context().unwrap();
    let consumer = context.get_instance::<Consumer>().unwrap();
    let injected = consumer.dependency.as_ref().unwrap();
    assert!(Arc::ptr_eq(injected, &dependency));
}

#[test]
fn test_class_binding_constructs_fresh_instances() {
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(Arc::new(Dependency));
    config
        .bind_component::<Consumer>(&consumer_with_constructor())
        .unwrap();

    let context = config.get_context().unwrap();
    let first = context.get_instance::<Consumer>().unwrap();
    let second = context.get_instance::<Consumer>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_interface_keyed_binding() {
    let implementation = Arc::new(EnglishGreeter);
    let mut config = ContextConfig::new();
    config.bind_instance::<dyn Greeter, EnglishGreeter>(implementation);

    let context = config.get_context().unwrap();
    let resolved = context
        .get(&ComponentRef::of::<dyn Greeter>())
        .unwrap()
        .instance::<EnglishGreeter>()
        .unwrap();
    assert_eq!(resolved.greet(), "hello");
}

#[test]
fn test_provider_reference_resolves_lazily() {
    let dependency = Arc::new(Dependency);
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(Arc::clone(&dependency));

    let context = config.get_context().unwrap();
    let lazy: Lazy<Dependency> = context
        .get(&ComponentRef::provider::<Dependency>())
        .unwrap()
        .lazy()
        .unwrap();
    assert!(Arc::ptr_eq(&lazy.get().unwrap(), &dependency));
}

#[test]
fn test_unsupported_container_resolves_to_none() {
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(Arc::new(Dependency));

    let context = config.get_context().unwrap();
    assert!(context.get(&ComponentRef::other::<Dependency>("Vec")).is_none());
}

#[test]
fn test_qualified_binding_resolves_by_each_qualifier() {
    let dependency = Arc::new(Dependency);
    let mut config = ContextConfig::new();
    config
        .bind_qualified_instance::<Dependency, Dependency>(
            Arc::clone(&dependency),
            &[Tag::named("ChosenOne"), Tag::qualifier("Skywalker")],
        )
        .unwrap();

    let context = config.get_context().unwrap();
    for tag in [Tag::named("ChosenOne"), Tag::qualifier("Skywalker")] {
        let resolved = context
            .get(&ComponentRef::qualified::<Dependency>(tag))
            .unwrap()
            .instance::<Dependency>()
            .unwrap();
        assert!(Arc::ptr_eq(&resolved, &dependency));
    }
    // Квалифицированный биндинг не виден под неквалифицированным ключом.
    assert!(context.get_instance::<Dependency>().is_none());
}

#[test]
fn test_non_qualifier_tag_rejected_at_bind() {
    let mut config = ContextConfig::new();
    let error = config
        .bind_qualified_instance::<Dependency, Dependency>(
            Arc::new(Dependency),
            &[Tag::named("ChosenOne"), Tag::plain("Test")],
        )
        .unwrap_err();
    assert!(matches!(error, ContainerError::IllegalComponent { .. }));
}

#[test]
fn test_qualified_component_binding() {
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(Arc::new(Dependency));
    config
        .bind_qualified_component::<Consumer>(
            &consumer_with_constructor(),
            &[Tag::named("ChosenOne")],
        )
        .unwrap();

    let context = config.get_context().unwrap();
    let reference = ComponentRef::qualified::<Consumer>(Tag::named("ChosenOne"));
    let consumer = context.get(&reference).unwrap().instance::<Consumer>().unwrap();
    assert!(consumer.dependency.is_some());
}

fn consumer_requiring(reference: ComponentRef) -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<Consumer>("Consumer")
        .default_constructor(|| Consumer { dependency: None })
        .inject_field("dependency", reference, |_, _| Some(()))
        .build()
}

#[rstest]
#[case::direct(ComponentRef::of::<Dependency>())]
#[case::provider(ComponentRef::provider::<Dependency>())]
#[case::qualified(ComponentRef::qualified::<Dependency>(Tag::named("ChosenOne")))]
#[case::qualified_provider(ComponentRef::qualified_provider::<Dependency>(Tag::named("ChosenOne")))]
#[case::unsupported(ComponentRef::other::<Dependency>("Vec"))]
fn test_missing_dependency_detected_at_get_context(#[case] reference: ComponentRef) {
    let expected = reference.key().clone();
    let mut config = ContextConfig::new();
    config
        .bind_component::<Consumer>(&consumer_requiring(reference))
        .unwrap();

    let error = config.get_context().unwrap_err();
    match error {
        ContainerError::DependencyNotFound {
            component,
            dependency,
        } => {
            assert_eq!(component, ComponentKey::of::<Consumer>());
            assert_eq!(dependency, expected);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Clone, Copy, Debug)]
enum Site {
    Constructor,
    Field,
    Method,
}

macro_rules! depends_on {
    ($owner:ident, $dep:ident, $site:expr) => {{
        match $site {
            Site::Constructor => ClassDescriptor::builder::<$owner>(stringify!($owner))
                .inject_constructor(vec![ComponentRef::of::<$dep>()], |args| {
                    Some($owner {
                        dependency: args.instance::<$dep>(0),
                    })
                })
                .build(),
            Site::Field => ClassDescriptor::builder::<$owner>(stringify!($owner))
                .default_constructor(|| $owner { dependency: None })
                .inject_field("dependency", ComponentRef::of::<$dep>(), |c, value| {
                    c.dependency = Some(value.instance::<$dep>()?);
                    Some(())
                })
                .build(),
            Site::Method => ClassDescriptor::builder::<$owner>(stringify!($owner))
                .default_constructor(|| $owner { dependency: None })
                .inject_method("install", vec![ComponentRef::of::<$dep>()], |c, args| {
                    c.dependency = Some(args.instance::<$dep>(0)?);
                    Some(())
                })
                .build(),
        }
    }};
}

struct ComponentOne {
    dependency: Option<Arc<ComponentTwo>>,
}

struct ComponentTwo {
    dependency: Option<Arc<ComponentOne>>,
}

#[rstest]
fn test_direct_cycle_detected(
    #[values(Site::Constructor, Site::Field, Site::Method)] one: Site,
    #[values(Site::Constructor, Site::Field, Site::Method)] two: Site,
) {
    let mut config = ContextConfig::new();
    config
        .bind_component::<ComponentOne>(&depends_on!(ComponentOne, ComponentTwo, one))
        .unwrap();
    config
        .bind_component::<ComponentTwo>(&depends_on!(ComponentTwo, ComponentOne, two))
        .unwrap();

    let error = config.get_context().unwrap_err();
    match error {
        ContainerError::CyclicDependency { components } => {
            assert_eq!(components.len(), 2);
            assert!(components.contains(&ComponentKey::of::<ComponentOne>()));
            assert!(components.contains(&ComponentKey::of::<ComponentTwo>()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn test_transitive_cycle_detected(
    #[values(Site::Constructor, Site::Field, Site::Method)] one: Site,
    #[values(Site::Constructor, Site::Field, Site::Method)] two: Site,
    #[values(Site::Constructor, Site::Field, Site::Method)] three: Site,
) {
    // First -> Middle -> Last -> First
    struct First {
        dependency: Option<Arc<Middle>>,
    }

    struct Middle {
        dependency: Option<Arc<Last>>,
    }

    struct Last {
        dependency: Option<Arc<First>>,
    }

    let mut config = ContextConfig::new();
    config
        .bind_component::<First>(&depends_on!(First, Middle, one))
        .unwrap();
    config
        .bind_component::<Middle>(&depends_on!(Middle, Last, two))
        .unwrap();
    config
        .bind_component::<Last>(&depends_on!(Last, First, three))
        .unwrap();

    let error = config.get_context().unwrap_err();
    match error {
        ContainerError::CyclicDependency { components } => {
            assert_eq!(components.len(), 3);
            assert!(components.contains(&ComponentKey::of::<First>()));
            assert!(components.contains(&ComponentKey::of::<Middle>()));
            assert!(components.contains(&ComponentKey::of::<Last>()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_provider_reference_breaks_cycle() {
    struct Engine {
        peer: Option<Lazy<Car>>,
    }

    struct Car {
        engine: Arc<Engine>,
    }

    let engine = ClassDescriptor::builder::<Engine>("Engine")
        .default_constructor(|| Engine { peer: None })
        .inject_field("peer", ComponentRef::provider::<Car>(), |e, value| {
            e.peer = Some(value.lazy::<Car>()?);
            Some(())
        })
        .build();
    let car = ClassDescriptor::builder::<Car>("Car")
        .inject_constructor(vec![ComponentRef::of::<Engine>()], |args| {
            Some(Car {
                engine: args.instance::<Engine>(0)?,
            })
        })
        .build();

    let mut config = ContextConfig::new();
    config.bind_component::<Engine>(&engine).unwrap();
    config.bind_component::<Car>(&car).unwrap();

    let context = config.get_context().unwrap();
    let car = context.get_instance::<Car>().unwrap();
    let lazy = car.engine.peer.as_ref().unwrap();
    assert!(lazy.get().is_some());
}

#[test]
fn test_rebinding_takes_last_binding() {
    let first = Arc::new(Dependency);
    let second = Arc::new(Dependency);
    let mut config = ContextConfig::new();
    config.bind_instance::<Dependency, Dependency>(first);
    config.bind_instance::<Dependency, Dependency>(Arc::clone(&second));

    let context = config.get_context().unwrap();
    let resolved = context.get_instance::<Dependency>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &second));
}
