use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use mentor_core::dump::{dump_object, format_value};
use mentor_core::reflect::{FieldDef, TypeDef, TypeRegistry, Value};
use mentor_core::scene::{ObjectFlags, ObjectId, Scene};

fn build_scene() -> (Scene, ObjectId) {
    let mut registry = TypeRegistry::new();
    registry.register(TypeDef::builder("Package").build());
    registry.register(
        TypeDef::builder("SceneComponent")
            .field(FieldDef::new("Visible", "bool", Value::Bool(true)).editable())
            .field(FieldDef::new("Scale", "double", Value::Float(1.0)).editable())
            .build(),
    );
    registry.register(
        TypeDef::builder("Actor")
            .field(FieldDef::new("Root", "TObjectPtr<USceneComponent>", Value::Object(None)))
            .field(
                FieldDef::new(
                    "Tags",
                    "TArray<FName>",
                    Value::Array((0..32).map(|i| Value::String(format!("Tag{i}"))).collect()),
                )
                .editable(),
            )
            .field(FieldDef::new("Health", "int32", Value::Int(100)).editable())
            .build(),
    );

    let mut scene = Scene::new(Arc::new(registry));
    let level = scene.spawn("Package", None, "/Game/Bench").unwrap();
    let actor = scene.spawn("Actor", Some(level), "Actor").unwrap();
    let root = scene.spawn("SceneComponent", Some(actor), "Root").unwrap();
    scene
        .set_field(actor, "Root", Value::Object(Some(root)))
        .unwrap();
    (scene, actor)
}

// ---------------------------------------------------------------------------
// Value formatting
// ---------------------------------------------------------------------------

fn bench_format_array(c: &mut Criterion) {
    let (scene, actor) = build_scene();
    let object = scene.get(actor).unwrap();
    let field = object.class().field("Tags").unwrap().clone();
    let value = object.get("Tags").unwrap().clone();
    c.bench_function("format_value_array_32", |b| {
        b.iter(|| {
            black_box(format_value(
                &scene,
                Some(&field),
                Some(black_box(&value)),
                false,
                false,
                None,
            ))
        });
    });
}

fn bench_dump_object(c: &mut Criterion) {
    let (scene, actor) = build_scene();
    c.bench_function("dump_object_with_subobject", |b| {
        b.iter(|| black_box(dump_object(&scene, black_box(actor), true, false)));
    });
}

// ---------------------------------------------------------------------------
// Scene duplication
// ---------------------------------------------------------------------------

fn bench_duplicate_and_collect(c: &mut Criterion) {
    let (mut scene, actor) = build_scene();
    let transient = scene.transient_package();
    let mut counter = 0u64;
    c.bench_function("duplicate_then_collect", |b| {
        b.iter(|| {
            counter += 1;
            let name = format!("Copy_{counter}");
            let copy = scene
                .duplicate(actor, transient, &name, ObjectFlags::TRANSIENT)
                .unwrap();
            scene.set_flags(copy, ObjectFlags::GARBAGE).unwrap();
            black_box(scene.collect_garbage())
        });
    });
}

criterion_group!(
    benches,
    bench_format_array,
    bench_dump_object,
    bench_duplicate_and_collect
);
criterion_main!(benches);
