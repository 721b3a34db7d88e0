// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors
//! Tests for RegistryBuilder / LayoutRegistry.

use super::*;
use crate::config::{COMMON_CONN_TYPE, INPUT_FIELD, RAW_INPUT_FIELD};
use crate::layout::FieldKind;
use std::io::Cursor;
use std::mem::offset_of;

#[derive(crate::Layout, Default)]
struct CommonConn {
    input: Cursor<Vec<u8>>,
    #[layout(rename = "rawInput")]
    raw_input: Vec<u8>,
    #[layout(skip)]
    _peer: String,
}

#[derive(crate::Layout, Default)]
struct ServerConn {
    handshake_done: bool,
    input: Cursor<Vec<u8>>,
    #[layout(rename = "rawInput")]
    raw_input: Vec<u8>,
}

mod shadow {
    // Same registry name as the outer `CommonConn`, different Rust type.
    #[derive(crate::Layout)]
    pub struct CommonConn {
        pub input: Vec<u8>,
    }
}

/// Hand-written impl reporting a field past the end of the type.
struct Lying {
    _value: u32,
}

unsafe impl Layout for Lying {
    const TYPE_NAME: &'static str = "Lying";

    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(
            Self::TYPE_NAME,
            vec![FieldLayout::of::<Self, u64>("value", 0)],
        )
    }
}

/// Packed wrapper; the derive refuses these, so the impl is hand-written.
#[repr(C, packed)]
struct PackedConn {
    _flag: u8,
    _sequence: u64,
}

unsafe impl Layout for PackedConn {
    const TYPE_NAME: &'static str = "PackedConn";

    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(
            Self::TYPE_NAME,
            vec![FieldLayout::of::<Self, u64>(
                "sequence",
                offset_of!(PackedConn, _sequence),
            )],
        )
    }
}

/// Same packed wrapper, but the descriptor understates the field alignment.
#[repr(C, packed)]
struct UnderstatedConn {
    _flag: u8,
    _sequence: u64,
}

unsafe impl Layout for UnderstatedConn {
    const TYPE_NAME: &'static str = "UnderstatedConn";

    fn describe() -> TypeDescriptor {
        let sequence =
            FieldLayout::of::<Self, u64>("sequence", offset_of!(UnderstatedConn, _sequence));
        TypeDescriptor::of::<Self>(
            Self::TYPE_NAME,
            vec![FieldLayout {
                alignment: 1,
                ..sequence
            }],
        )
    }
}

/// Reports `body` at an offset that is not a multiple of 8.
#[repr(C)]
struct SkewedConn {
    _head: u32,
    _tail: u32,
    _body: u64,
}

unsafe impl Layout for SkewedConn {
    const TYPE_NAME: &'static str = "SkewedConn";

    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(
            Self::TYPE_NAME,
            vec![FieldLayout::of::<Self, u64>("body", 4)],
        )
    }
}

/// Correct field, wrong type size in the descriptor.
#[derive(Default)]
struct MisreportedConn {
    window: u32,
}

unsafe impl Layout for MisreportedConn {
    const TYPE_NAME: &'static str = "MisreportedConn";

    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            size_bytes: 1024,
            ..TypeDescriptor::of::<Self>(
                Self::TYPE_NAME,
                vec![FieldLayout::of::<Self, u32>(
                    "window",
                    offset_of!(MisreportedConn, window),
                )],
            )
        }
    }
}

fn builder_with_verification(verify: bool) -> RegistryBuilder {
    RegistryBuilder::with_config(RegistryConfig::default().with_verify_layouts(verify))
}

fn common_registry() -> LayoutRegistry {
    let mut builder = RegistryBuilder::new();
    builder
        .register::<CommonConn>(&[INPUT_FIELD, RAW_INPUT_FIELD])
        .expect("register CommonConn");
    builder.seal().expect("seal")
}

#[test]
fn register_and_lookup_common_conn() {
    let registry = common_registry();

    let input = registry
        .lookup(COMMON_CONN_TYPE, INPUT_FIELD)
        .expect("input registered");
    assert_eq!(input.offset_bytes, offset_of!(CommonConn, input));
    assert_eq!(input.kind, FieldKind::ByteReader);

    let raw = registry
        .lookup(COMMON_CONN_TYPE, RAW_INPUT_FIELD)
        .expect("rawInput registered");
    assert_eq!(raw.offset_bytes, offset_of!(CommonConn, raw_input));
    assert_eq!(raw.kind, FieldKind::ByteBuffer);
    assert_eq!(raw.kind.tag(), "byte-buffer");

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.field_count(), 2);
}

#[test]
fn lookup_misses_return_none() {
    let registry = common_registry();

    assert!(registry.lookup("UnknownType", "x").is_none());
    assert!(registry.lookup(COMMON_CONN_TYPE, "unknownField").is_none());
    // Skipped and unregistered-but-described fields are misses too
    assert!(registry.lookup(COMMON_CONN_TYPE, "_peer").is_none());
    assert!(registry.lookup(COMMON_CONN_TYPE, "raw_input").is_none());

    assert_eq!(registry.stats().misses, 4);
}

#[test]
fn unknown_field_is_configuration_error() {
    let mut builder = RegistryBuilder::new();
    let err = builder
        .register::<CommonConn>(&[INPUT_FIELD, "output"])
        .expect_err("output does not exist");

    assert!(err.is_configuration());
    match err {
        Error::UnknownField { type_name, field } => {
            assert_eq!(type_name, COMMON_CONN_TYPE);
            assert_eq!(field, "output");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing from the failed call was recorded
    let registry = builder.seal().expect("seal");
    assert!(registry.is_empty());
}

#[test]
fn register_is_idempotent() {
    let mut builder = RegistryBuilder::new();
    builder
        .register::<CommonConn>(&[INPUT_FIELD])
        .expect("first")
        .register::<CommonConn>(&[INPUT_FIELD])
        .expect("second");
    let once = builder.seal().expect("seal");

    let twice = common_registry();
    assert_eq!(
        once.lookup(COMMON_CONN_TYPE, INPUT_FIELD),
        twice.lookup(COMMON_CONN_TYPE, INPUT_FIELD)
    );
    assert_eq!(once.field_count(), 1);
}

#[test]
fn reregistration_adds_new_fields_only() {
    let mut builder = RegistryBuilder::new();
    builder.register::<CommonConn>(&[INPUT_FIELD]).expect("first");
    builder
        .register::<CommonConn>(&[RAW_INPUT_FIELD, INPUT_FIELD, RAW_INPUT_FIELD])
        .expect("second");
    let registry = builder.seal().expect("seal");

    let desc = registry.descriptor(COMMON_CONN_TYPE).expect("descriptor");
    assert_eq!(
        desc.field_names().collect::<Vec<_>>(),
        vec![INPUT_FIELD, RAW_INPUT_FIELD]
    );
}

#[test]
fn register_all_describes_every_field() {
    let mut builder = RegistryBuilder::new();
    builder.register_all::<ServerConn>().expect("register all");
    let registry = builder.seal().expect("seal");

    for field in ["handshake_done", "input", "rawInput"] {
        assert!(registry.lookup("ServerConn", field).is_some(), "{field}");
    }
    assert_eq!(
        registry.descriptor_of::<ServerConn>().map(|d| d.type_name),
        Some("ServerConn")
    );
}

#[test]
fn type_name_conflict_rejected() {
    let mut builder = RegistryBuilder::new();
    builder.register::<CommonConn>(&[INPUT_FIELD]).expect("first");

    let err = builder
        .register::<shadow::CommonConn>(&[INPUT_FIELD])
        .expect_err("same name, different type");
    assert!(matches!(
        err,
        Error::TypeNameConflict {
            type_name: "CommonConn"
        }
    ));
}

#[test]
fn lying_layout_rejected_by_verification() {
    let mut builder = RegistryBuilder::new();
    let err = builder.register_all::<Lying>().expect_err("u64 in a u32");
    assert!(matches!(
        err,
        Error::InvalidLayout {
            type_name: "Lying",
            field: "value",
            ..
        }
    ));
}

#[test]
fn placement_checked_even_without_verification() {
    for verify in [true, false] {
        let mut builder = builder_with_verification(verify);

        let err = builder
            .register::<PackedConn>(&["sequence"])
            .expect_err("u64 in an align-1 wrapper");
        assert!(
            matches!(
                err,
                Error::InvalidLayout {
                    type_name: "PackedConn",
                    field: "sequence",
                    ..
                }
            ),
            "verify={verify}: {err}"
        );
        assert!(err.is_configuration());

        let err = builder
            .register_all::<SkewedConn>()
            .expect_err("offset 4 for a u64");
        assert!(
            matches!(
                err,
                Error::InvalidLayout {
                    type_name: "SkewedConn",
                    field: "body",
                    reason: "field offset is misaligned",
                }
            ),
            "verify={verify}: {err}"
        );

        let err = builder.register_all::<Lying>().expect_err("u64 in a u32");
        assert!(matches!(err, Error::InvalidLayout { field: "value", .. }));

        let registry = builder.seal().expect("seal");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.token::<PackedConn, u64>("sequence"),
            Err(Error::NotRegistered("PackedConn"))
        ));
    }
}

#[test]
fn token_rechecks_alignment_of_requested_type() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_all::<UnderstatedConn>()
        .expect("descriptor is self-consistent");
    let registry = builder.seal().expect("seal");

    assert!(registry.lookup("UnderstatedConn", "sequence").is_some());
    match registry.token::<UnderstatedConn, u64>("sequence") {
        Err(Error::InvalidLayout { field, .. }) => assert_eq!(field, "sequence"),
        other => panic!("unexpected: {:?}", other.map(|t| t.offset())),
    }
    assert_eq!(registry.stats().tokens_issued, 0);
}

#[test]
fn verification_switch_only_covers_descriptor_identity() {
    let mut verified = builder_with_verification(true);
    let err = verified
        .register_all::<MisreportedConn>()
        .expect_err("size 1024");
    assert!(matches!(
        err,
        Error::InvalidLayout {
            type_name: "MisreportedConn",
            field: "",
            ..
        }
    ));

    // Without verification the size mismatch passes, but the field itself
    // is still placed correctly, so tokens remain sound.
    let mut unverified = builder_with_verification(false);
    unverified
        .register_all::<MisreportedConn>()
        .expect("identity checks skipped");
    let registry = unverified.seal().expect("seal");
    let window = registry
        .token::<MisreportedConn, u32>("window")
        .expect("token");
    let conn = MisreportedConn { window: 65_535 };
    assert_eq!(*window.get(&conn), 65_535);
}

#[test]
fn builder_clamps_oversized_capacity() {
    let config = RegistryConfig::default().with_type_capacity(usize::MAX);
    let mut builder = RegistryBuilder::with_config(config);
    assert_eq!(builder.config().type_capacity, usize::MAX);

    builder
        .register::<CommonConn>(&[INPUT_FIELD, RAW_INPUT_FIELD])
        .expect("register");
    assert_eq!(builder.seal().expect("seal").field_count(), 2);
}

#[test]
fn missing_required_field_blocks_seal() {
    let config = RegistryConfig::default().require(COMMON_CONN_TYPE, [INPUT_FIELD, RAW_INPUT_FIELD]);
    let mut builder = RegistryBuilder::with_config(config);
    builder.register::<CommonConn>(&[INPUT_FIELD]).expect("register");

    match builder.seal() {
        Err(Error::MissingRequired { type_name, field }) => {
            assert_eq!(type_name, COMMON_CONN_TYPE);
            assert_eq!(field, RAW_INPUT_FIELD);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("seal must fail with an incomplete registry"),
    }
}

#[test]
fn required_fields_satisfied() {
    let config = RegistryConfig::default().require(COMMON_CONN_TYPE, [RAW_INPUT_FIELD]);
    let mut builder = RegistryBuilder::with_config(config);
    builder
        .register::<CommonConn>(&[INPUT_FIELD, RAW_INPUT_FIELD])
        .expect("register");
    assert!(builder.seal().is_ok());
}

#[test]
fn registration_order_does_not_change_offsets() {
    let mut forward = RegistryBuilder::new();
    forward.register_all::<CommonConn>().expect("common");
    forward.register_all::<ServerConn>().expect("server");
    let forward = forward.seal().expect("seal");

    let mut backward = RegistryBuilder::new();
    backward.register_all::<ServerConn>().expect("server");
    backward.register_all::<CommonConn>().expect("common");
    let backward = backward.seal().expect("seal");

    for (type_name, field) in [
        ("CommonConn", "input"),
        ("CommonConn", "rawInput"),
        ("ServerConn", "input"),
        ("ServerConn", "rawInput"),
        ("ServerConn", "handshake_done"),
    ] {
        assert_eq!(
            forward.lookup(type_name, field),
            backward.lookup(type_name, field),
            "{type_name}.{field}"
        );
    }
}

#[test]
fn token_checks_wrapper_and_field_types() {
    let mut builder = RegistryBuilder::new();
    builder.register::<CommonConn>(&[INPUT_FIELD, RAW_INPUT_FIELD]).expect("register");
    let registry = builder.seal().expect("seal");

    assert!(registry.token::<CommonConn, Vec<u8>>(RAW_INPUT_FIELD).is_ok());
    assert!(registry.token::<CommonConn, Cursor<Vec<u8>>>(INPUT_FIELD).is_ok());

    assert!(matches!(
        registry.token::<ServerConn, Vec<u8>>(RAW_INPUT_FIELD),
        Err(Error::NotRegistered("ServerConn"))
    ));
    assert!(matches!(
        registry.token::<CommonConn, Vec<u8>>("_peer"),
        Err(Error::FieldNotRegistered { .. })
    ));
    match registry.token::<CommonConn, u32>(RAW_INPUT_FIELD) {
        Err(Error::FieldTypeMismatch {
            field, expected, ..
        }) => {
            assert_eq!(field, RAW_INPUT_FIELD);
            assert!(expected.contains("Vec<u8>"));
        }
        other => panic!("unexpected: {:?}", other.map(|t| t.offset())),
    }

    assert_eq!(registry.stats().tokens_issued, 2);
}

#[test]
fn builder_capacity_from_config() {
    let builder = RegistryBuilder::with_config(RegistryConfig::default().with_type_capacity(2));
    assert_eq!(builder.config().type_capacity, 2);
    assert!(format!("{builder:?}").contains("RegistryBuilder"));
}

#[test]
fn registry_cell_lifecycle() {
    let cell = RegistryCell::new();
    assert_eq!(cell.state(), RegistryState::Uninitialized);
    assert!(matches!(cell.get(), Err(Error::NotReady)));

    cell.publish(common_registry()).expect("first publish");
    assert_eq!(cell.state(), RegistryState::Ready);
    assert!(cell.get().expect("ready").contains(COMMON_CONN_TYPE));

    assert!(matches!(
        cell.publish(common_registry()),
        Err(Error::AlreadyPublished)
    ));
}

#[test]
fn registry_cell_get_or_publish_builds_once() {
    let cell = RegistryCell::new();
    let mut builds = 0;

    for _ in 0..3 {
        let registry = cell
            .get_or_publish(|| {
                builds += 1;
                Ok(common_registry())
            })
            .expect("registry");
        assert_eq!(registry.len(), 1);
    }
    assert_eq!(builds, 1);
}

#[test]
fn registry_cell_build_failure_after_publication_uses_published() {
    let cell = RegistryCell::new();
    let registry = cell
        .get_or_publish(|| {
            // Another initializer wins while this build is still running.
            cell.publish(common_registry())?;
            Err(Error::Config("late build failed".to_string()))
        })
        .expect("published registry wins");

    assert!(registry.contains(COMMON_CONN_TYPE));
    assert_eq!(cell.state(), RegistryState::Ready);
}

#[test]
fn registry_cell_build_failure_stays_uninitialized() {
    let cell = RegistryCell::new();
    let err = cell
        .get_or_publish(|| {
            let mut builder = RegistryBuilder::new();
            builder.register::<CommonConn>(&["bogus"])?;
            builder.seal()
        })
        .expect_err("bogus field");

    assert!(err.is_configuration());
    assert_eq!(cell.state(), RegistryState::Uninitialized);
}
