use core::mem::size_of;
use std::rc::Rc;

use staged::{Absent, Finalize, Present, Staged};
use static_assertions::{assert_impl_all, assert_not_impl_any};

#[derive(Staged, Debug, PartialEq, Clone)]
struct Person {
    name: String,
    age: u32,
}

#[derive(Staged, Debug, PartialEq)]
struct Triple {
    a: u8,
    b: String,
    c: Vec<u16>,
}

#[derive(Staged, Debug, PartialEq)]
struct Point(i32, i32);

#[derive(Staged, Debug, PartialEq)]
struct Marker;

#[derive(Staged, Debug, PartialEq)]
struct Empty {}

#[derive(Staged)]
struct Sizes {
    wide: u64,
    narrow: u32,
}

#[derive(Staged)]
struct RcHolder {
    shared: Rc<u8>,
}

assert_not_impl_any!(PersonBuilder: Finalize);
assert_not_impl_any!(PersonBuilder<Present<String>, Absent<u32>>: Finalize);
assert_not_impl_any!(PersonBuilder<Absent<String>, Present<u32>>: Finalize);
assert_impl_all!(PersonBuilder<Present<String>, Present<u32>>: Finalize);
assert_impl_all!(MarkerBuilder: Finalize);
assert_impl_all!(EmptyBuilder: Finalize);

assert_impl_all!(PersonBuilder: Send, Sync);
assert_impl_all!(PersonBuilder<Present<String>, Present<u32>>: Send, Sync);
assert_impl_all!(RcHolderBuilder: Send, Sync);
assert_not_impl_any!(RcHolderBuilder<Present<Rc<u8>>>: Send, Sync);

fn ada() -> Person {
    Person {
        name: "Ada".to_string(),
        age: 36,
    }
}

#[test]
fn round_trip_in_declaration_order() {
    let person = Person::builder().name("Ada".to_string()).age(36).build();
    assert_eq!(person, ada());
}

#[test]
fn round_trip_in_reversed_order() {
    let person = Person::builder().age(36).name("Ada".to_string()).build();
    assert_eq!(person, ada());
}

#[test]
fn every_setter_order_reaches_the_same_state() {
    type Full = TripleBuilder<Present<u8>, Present<String>, Present<Vec<u16>>>;

    fn finish(builder: Full) -> Triple {
        builder.build()
    }

    let b = || "two".to_string();
    let c = || vec![3, 4];
    let built = [
        finish(Triple::builder().a(1).b(b()).c(c())),
        finish(Triple::builder().a(1).c(c()).b(b())),
        finish(Triple::builder().b(b()).a(1).c(c())),
        finish(Triple::builder().b(b()).c(c()).a(1)),
        finish(Triple::builder().c(c()).a(1).b(b())),
        finish(Triple::builder().c(c()).b(b()).a(1)),
    ];

    let expected = Triple {
        a: 1,
        b: b(),
        c: c(),
    };
    for triple in built {
        assert_eq!(triple, expected);
    }
}

#[test]
fn finalize_through_the_traits() {
    fn complete<T>() -> T
    where
        T: Staged,
        T::Builder: Finalize<Output = T>,
    {
        staged::finalize(T::builder())
    }

    assert_eq!(complete::<Marker>(), Marker);
    assert_eq!(complete::<Empty>(), Empty {});

    let full = <Person as Staged>::builder().age(36).name("Ada".to_string());
    assert_eq!(Finalize::finalize(full), ada());
}

#[test]
fn zero_field_records_are_immediately_finalizable() {
    assert_eq!(Marker::builder().build(), Marker);
    assert_eq!(Empty::builder().build(), Empty {});
    assert_eq!(<MarkerBuilder>::FIELD_NAMES.len(), 0);
}

#[test]
fn tuple_struct_setters_are_positional() {
    let point = Point::builder().field_1(2).field_0(1).build();
    assert_eq!(point, Point(1, 2));
    assert_eq!(<PointBuilder>::FIELD_NAMES, ["0", "1"]);
}

#[test]
fn generics_lifetimes_and_consts_are_carried() {
    #[derive(Staged, Debug, PartialEq)]
    struct Window<'a, T: Clone, const N: usize>
    where
        T: Default,
    {
        label: &'a str,
        items: [T; N],
    }

    let label = String::from("main");
    let window = Window::builder().items([1u8, 2, 3]).label(label.as_str()).build();
    assert_eq!(
        window,
        Window {
            label: "main",
            items: [1, 2, 3],
        }
    );
}

#[test]
fn container_and_field_options() {
    #[derive(Staged, Debug, PartialEq)]
    #[staged(builder = RequestMaker, entry = start, finalize = send)]
    struct Request {
        #[staged(setter = with_url, into)]
        url: String,
        #[staged(into)]
        retries: u64,
    }

    let maker: RequestMaker = Request::start();
    let request = maker.retries(3u8).with_url("https://example.com").send();
    assert_eq!(
        request,
        Request {
            url: "https://example.com".to_string(),
            retries: 3,
        }
    );
}

#[test]
fn awkward_field_names() {
    #[derive(Staged, Debug, PartialEq)]
    struct Awkward {
        r#type: u8,
        value: u32,
        other: u32,
    }

    let awkward = Awkward::builder().other(2).value(1).r#type(7).build();
    assert_eq!(
        awkward,
        Awkward {
            r#type: 7,
            value: 1,
            other: 2,
        }
    );
    assert_eq!(<AwkwardBuilder>::FIELD_NAMES, ["type", "value", "other"]);
}

#[test]
fn self_referential_records() {
    #[derive(Staged, Debug, PartialEq)]
    struct Node {
        value: u8,
        next: Option<Box<Self>>,
    }

    let leaf = Node::builder().next(None).value(2).build();
    let root = Node::builder().value(1).next(Some(Box::new(leaf))).build();
    assert_eq!(root.value, 1);
    assert_eq!(root.next.as_ref().map(|n| n.value), Some(2));
}

#[test]
fn arrows_inside_generic_field_types() {
    #[derive(Staged)]
    struct Handler {
        f: Result<fn() -> u8, ()>,
        g: u8,
    }

    fn seven() -> u8 {
        7
    }

    let handler = Handler::builder().g(1).f(Ok(seven as fn() -> u8)).build();
    assert_eq!(handler.g, 1);
    assert_eq!(handler.f.map(|f| f()), Ok(7));
}

#[test]
fn presence_is_known_per_state() {
    assert_eq!(<PersonBuilder>::FIELD_NAMES, ["name", "age"]);
    assert_eq!(<PersonBuilder>::PRESENCE, [false, false]);
    assert_eq!(
        <PersonBuilder<Present<String>, Absent<u32>>>::PRESENCE,
        [true, false]
    );

    let builder = Person::builder().age(3);
    assert_eq!(builder.presence(), [false, true]);
    let builder = builder.name("x".to_string());
    assert_eq!(builder.presence(), [true, true]);
}

#[test]
fn debug_shows_presence_not_values() {
    struct Opaque;

    #[derive(Staged)]
    struct Secretive {
        public: u8,
        hidden: Opaque,
    }

    let builder = Secretive::builder().hidden(Opaque);
    assert_eq!(
        format!("{builder:?}"),
        "SecretiveBuilder { public: <absent>, hidden: <present> }"
    );
    assert_eq!(
        format!("{:?}", Person::builder()),
        "PersonBuilder { name: <absent>, age: <absent> }"
    );
}

#[test]
fn absent_slots_take_no_space() {
    assert_eq!(size_of::<SizesBuilder>(), 0);
    assert_eq!(size_of::<SizesBuilder<Present<u64>, Absent<u32>>>(), 8);
    assert_eq!(size_of::<SizesBuilder<Absent<u64>, Present<u32>>>(), 4);
    assert_eq!(
        size_of::<SizesBuilder<Present<u64>, Present<u32>>>(),
        size_of::<Sizes>()
    );
}
