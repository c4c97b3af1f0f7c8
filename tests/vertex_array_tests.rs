//! Integration tests for vertex arrays.

mod common;

use rstest::rstest;

use common::TestContext;
use redlilium_gl::backend::BufferTarget;
use redlilium_gl::vertex::compute_attribute_offsets;
use redlilium_gl::{
    AttributeType, Buffer, ComponentType, GlCall, VertexArray, VertexAttribute,
    VertexAttributeDescriptor, VertexBufferBinding, VertexStepMode,
};

#[rstest]
#[case::float(AttributeType::Float, false)]
#[case::int(AttributeType::Int, true)]
#[case::uint(AttributeType::UnsignedInt, true)]
fn test_owned_pointer_kind(#[case] attribute_type: AttributeType, #[case] integer: bool) {
    let t = TestContext::new();
    let mut vertex_array = VertexArray::with_owned_buffers(&t.ctx, 64, 16, 0).unwrap();
    vertex_array.add_attribute(VertexAttribute::new(
        0,
        2,
        attribute_type,
        VertexStepMode::Vertex,
    ));
    t.take_calls();

    vertex_array.create_attribute_bindings();

    let calls = t.take_calls();
    let integer_calls = calls
        .iter()
        .filter(|c| matches!(c, GlCall::VertexAttribIPointer { .. }))
        .count();
    let float_calls = calls
        .iter()
        .filter(|c| matches!(c, GlCall::VertexAttribPointer { normalized: false, .. }))
        .count();
    assert_eq!(integer_calls, integer as usize);
    assert_eq!(float_calls, !integer as usize);
}

#[test]
fn test_owned_layout_matches_offsets() {
    let t = TestContext::new();
    let mut vertex_array = VertexArray::with_owned_buffers(&t.ctx, 1024, 256, 512).unwrap();
    let attributes = [
        VertexAttribute::new(0, 3, AttributeType::Float, VertexStepMode::Vertex),
        VertexAttribute::new(1, 3, AttributeType::Float, VertexStepMode::Vertex),
        VertexAttribute::new(2, 4, AttributeType::Float, VertexStepMode::Instance),
        VertexAttribute::new(3, 4, AttributeType::Float, VertexStepMode::Instance),
        VertexAttribute::new(4, 1, AttributeType::UnsignedInt, VertexStepMode::Instance),
    ];
    for attribute in attributes {
        vertex_array.add_attribute(attribute);
    }
    t.take_calls();
    vertex_array.create_attribute_bindings();

    let layout = compute_attribute_offsets(vertex_array.attributes());
    assert_eq!(layout.offsets, vec![0, 12, 0, 16, 32]);

    let pointers: Vec<(u32, usize, usize)> = t
        .take_calls()
        .into_iter()
        .filter_map(|c| match c {
            GlCall::VertexAttribPointer {
                location,
                stride,
                offset,
                ..
            }
            | GlCall::VertexAttribIPointer {
                location,
                stride,
                offset,
                ..
            } => Some((location, stride, offset)),
            _ => None,
        })
        .collect();
    assert_eq!(
        pointers,
        vec![(0, 24, 0), (1, 24, 12), (2, 36, 0), (3, 36, 16), (4, 36, 32)]
    );
}

#[test]
fn test_rebuilding_bindings_after_new_attribute() {
    let t = TestContext::new();
    let mut vertex_array = VertexArray::with_owned_buffers(&t.ctx, 64, 0, 0).unwrap();
    vertex_array.add_attribute(VertexAttribute::new(
        0,
        2,
        AttributeType::Float,
        VertexStepMode::Vertex,
    ));
    vertex_array.create_attribute_bindings();
    vertex_array.add_attribute(VertexAttribute::new(
        1,
        2,
        AttributeType::Float,
        VertexStepMode::Vertex,
    ));
    t.take_calls();

    vertex_array.create_attribute_bindings();

    assert!(t.take_calls().contains(&GlCall::VertexAttribPointer {
        location: 0,
        components: 2,
        component_type: gl::FLOAT,
        normalized: false,
        stride: 16,
        offset: 0,
    }));
}

#[test]
fn test_borrowed_and_owned_arrays_release_once() {
    let t = TestContext::new();
    let positions = Buffer::new(&t.ctx, 48).unwrap();
    let borrowed = VertexArray::with_bindings(
        &t.ctx,
        vec![VertexBufferBinding::new(&positions, 12)
            .with_attribute(VertexAttributeDescriptor::float(0, 3, 0))],
    )
    .unwrap();
    let owned = VertexArray::with_owned_buffers(&t.ctx, 16, 16, 16).unwrap();

    let moved = owned;
    drop(borrowed);
    drop(moved);

    assert_eq!(
        t.backend
            .count_calls(|c| matches!(c, GlCall::DeleteVertexArray(_))),
        2
    );
    // Only the borrowed buffer is still alive.
    assert_eq!(t.backend.live_objects(), 1);
    drop(positions);
    assert_eq!(t.backend.live_objects(), 0);
}

#[test]
fn test_interleaved_binding_with_normalized_colors() {
    let t = TestContext::new();
    let vertices = Buffer::new(&t.ctx, 16 * 3).unwrap();
    t.take_calls();

    let _vertex_array = VertexArray::with_bindings(
        &t.ctx,
        vec![VertexBufferBinding::new(&vertices, 16)
            .with_attribute(VertexAttributeDescriptor::float(0, 3, 0))
            .with_attribute(
                VertexAttributeDescriptor::new(1, 4, ComponentType::UnsignedByte, 12)
                    .with_normalized(true),
            )],
    )
    .unwrap();

    let calls = t.take_calls();
    assert!(calls.contains(&GlCall::VertexAttribPointer {
        location: 1,
        components: 4,
        component_type: gl::UNSIGNED_BYTE,
        normalized: true,
        stride: 16,
        offset: 12,
    }));
    assert_eq!(
        calls.last(),
        Some(&GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: None,
        })
    );
}
