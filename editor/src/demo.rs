//! Built-in gameplay types and a small level to experiment with.

use std::sync::Arc;

use mentor_core::reflect::{DelegateBinding, FieldDef, FieldFlags, TypeDef, TypeRegistry, Value};
use mentor_core::scene::{ObjectId, Scene, SceneError};

pub const LEVEL_PATH: &str = "/Game/Maps/Demo";

/// Ids of the objects [`demo_scene`] creates.
#[derive(Debug, Clone, Copy)]
pub struct DemoObjects {
    pub level: ObjectId,
    pub hero: ObjectId,
    pub door: ObjectId,
    pub door_root: ObjectId,
    pub door_blueprint: ObjectId,
    pub dash: ObjectId,
}

fn vector(x: f64, y: f64, z: f64) -> Value {
    Value::Struct {
        name: "Vector".to_string(),
        fields: vec![
            ("X".to_string(), Value::Float(x)),
            ("Y".to_string(), Value::Float(y)),
            ("Z".to_string(), Value::Float(z)),
        ],
    }
}

/// Registers the engine and game types used by the demo level.
pub fn demo_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(TypeDef::builder("Package").build());

    let read_only = FieldFlags::BLUEPRINT_VISIBLE | FieldFlags::BLUEPRINT_READ_ONLY;

    let component = registry.register(
        TypeDef::builder("ActorComponent")
            .field(FieldDef::new("bAutoActivate", "bool", Value::Bool(true)).editable())
            .field(FieldDef::new("ComponentTags", "TArray<FName>", Value::Array(Vec::new())).editable())
            .build(),
    );
    registry.register(
        TypeDef::builder("SceneComponent")
            .parent(&component)
            .field(FieldDef::new("RelativeLocation", "FVector", vector(0.0, 0.0, 0.0)).editable())
            .field(
                FieldDef::new(
                    "Mobility",
                    "EComponentMobility",
                    Value::Enum {
                        name: "Static".to_string(),
                        value: 0,
                    },
                )
                .editable(),
            )
            .field(FieldDef::new("bVisible", "bool", Value::Bool(true)).editable())
            .build(),
    );

    let actor = registry.register(
        TypeDef::builder("Actor")
            .field(FieldDef::new("Health", "int32", Value::Int(100)).editable())
            .field(FieldDef::new("bHidden", "bool", Value::Bool(false)).editable())
            .field(FieldDef::new("Tags", "TArray<FName>", Value::Array(Vec::new())).editable())
            .field(FieldDef::new(
                "RootComponent",
                "TObjectPtr<USceneComponent>",
                Value::Object(None),
            ))
            .field(FieldDef::new("Owner", "TWeakObjectPtr<AActor>", Value::WeakObject(None)).with_flags(read_only))
            .field(
                FieldDef::new("OnDestroyed", "FActorDestroyedSignature", Value::MulticastDelegate(Vec::new()))
                    .with_flags(FieldFlags::BLUEPRINT_ASSIGNABLE),
            )
            .field(FieldDef::new("__NetGUID", "uint64", Value::Int(0)))
            .build(),
    );
    registry.register(
        TypeDef::builder("StaticMeshActor")
            .parent(&actor)
            .field(
                FieldDef::new("StaticMesh", "TSoftObjectPtr<UStaticMesh>", Value::SoftObject(String::new()))
                    .editable(),
            )
            .build(),
    );
    registry.register(
        TypeDef::builder("BP_Door_C")
            .parent(&actor)
            .field(FieldDef::new("bIsOpen", "bool", Value::Bool(false)).editable())
            .field(FieldDef::new("OpenAngle", "double", Value::Float(90.0)).editable())
            .field(FieldDef::new("__UberGraphFrame", "FPointerToUberGraphFrame", Value::Other(String::new())))
            .default_override("Health", Value::Int(250))
            .build(),
    );

    registry.register(
        TypeDef::builder("Blueprint")
            .field(FieldDef::new("ParentClass", "TSubclassOf<UObject>", Value::SoftObject(String::new())).editable())
            .field(FieldDef::new("BlueprintDescription", "FString", Value::String(String::new())).editable())
            .build(),
    );
    registry.register(
        TypeDef::builder("GameplayAbility")
            .field(FieldDef::new("Cooldown", "float", Value::Float(1.0)).editable())
            .field(FieldDef::new("AbilityTags", "FGameplayTagContainer", Value::Set(Vec::new())).editable())
            .field(
                FieldDef::new("OnAbilityEnded", "FOnGameplayAbilityEnded", Value::Delegate(None))
                    .with_flags(FieldFlags::BLUEPRINT_ASSIGNABLE),
            )
            .build(),
    );

    registry
}

/// A scene with the demo types and an empty level.
pub fn empty_scene() -> Result<(Scene, ObjectId), SceneError> {
    let mut scene = Scene::new(Arc::new(demo_registry()));
    let level = scene.spawn("Package", None, LEVEL_PATH)?;
    Ok((scene, level))
}

/// The demo level: a hero, a blueprint door with its root component, the
/// door's blueprint asset and a gameplay ability.
pub fn demo_scene() -> Result<(Scene, DemoObjects), SceneError> {
    let (mut scene, level) = empty_scene()?;

    let hero = scene.spawn("Actor", Some(level), "Hero")?;
    scene.set_field(hero, "Tags", Value::Array(vec![Value::String("Player".to_string())]))?;

    let door = scene.spawn("BP_Door_C", Some(level), "BP_Door_C_0")?;
    let door_root = scene.spawn("SceneComponent", Some(door), "DefaultSceneRoot")?;
    scene.set_field(door, "RootComponent", Value::Object(Some(door_root)))?;
    scene.set_field(door, "Owner", Value::WeakObject(Some(hero)))?;
    scene.set_field(
        door,
        "OnDestroyed",
        Value::MulticastDelegate(vec![DelegateBinding {
            object: Some(hero),
            function: "HandleDoorDestroyed".to_string(),
        }]),
    )?;
    scene.set_field(door_root, "RelativeLocation", vector(400.0, 0.0, 0.0))?;

    let blueprints = scene.spawn("Package", None, "/Game/Blueprints/BP_Door")?;
    let door_blueprint = scene.spawn("Blueprint", Some(blueprints), "BP_Door")?;
    scene.set_field(
        door_blueprint,
        "ParentClass",
        Value::SoftObject("/Script/Engine.Actor".to_string()),
    )?;

    let abilities = scene.spawn("Package", None, "/Game/Abilities/GA_Dash")?;
    let dash = scene.spawn("GameplayAbility", Some(abilities), "GA_Dash")?;

    log::info!("Demo scene ready ({} objects)", scene.len());
    Ok((
        scene,
        DemoObjects {
            level,
            hero,
            door,
            door_root,
            door_blueprint,
            dash,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_types_resolve_their_hierarchy() {
        let registry = demo_registry();
        let door = registry.get("BP_Door_C").unwrap();
        assert!(door.is_a("Actor"));
        assert_eq!(door.default_value("Health"), Some(&Value::Int(250)));
        assert!(registry.get("SceneComponent").unwrap().is_a("ActorComponent"));
        assert!(!registry.get("Blueprint").unwrap().is_a("Actor"));
    }

    #[test]
    fn demo_scene_paths() {
        let (scene, ids) = demo_scene().unwrap();
        assert_eq!(scene.get(ids.door).unwrap().path(), "/Game/Maps/Demo.BP_Door_C_0");
        assert_eq!(
            scene.get(ids.door_root).unwrap().path(),
            "/Game/Maps/Demo.BP_Door_C_0.DefaultSceneRoot"
        );
        assert_eq!(scene.get(ids.door_blueprint).unwrap().path(), "/Game/Blueprints/BP_Door.BP_Door");
        assert_eq!(scene.get(ids.dash).unwrap().class_name(), "GameplayAbility");
        assert_eq!(scene.find_by_path("/Game/Maps/Demo.Hero").map(|o| o.id()), Some(ids.hero));
    }
}
