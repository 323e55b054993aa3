use bevy::{
    prelude::*,
    render::{
        mesh::{Indices, MeshVertexAttribute, VertexAttributeValues},
        render_asset::RenderAssetUsages,
        render_resource::PrimitiveTopology,
    },
    utils::HashMap,
};

use super::{
    helpers::geometry::get_chunk_coord_transform, ChunkCoord, ChunkMesh, MeshUpdate,
    TerrainManager,
};

#[derive(Resource, Deref)]
pub struct TerrainMaterial(pub Handle<StandardMaterial>);

pub(super) fn setup_terrain_material(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.8,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    commands.insert_resource(TerrainMaterial(material));
}

/// Builds a render mesh carrying every buffer of `chunk_mesh`.
pub fn build_mesh(chunk_mesh: &ChunkMesh) -> Mesh {
    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, chunk_mesh.positions().to_vec())
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, chunk_mesh.normals().to_vec())
    .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, chunk_mesh.colors().to_vec())
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, chunk_mesh.uvs().to_vec())
    .with_inserted_indices(Indices::U32(chunk_mesh.indices().to_vec()))
}

/// Overwrites the height dependent attributes of `mesh` in place.
pub fn write_heights(mesh: &mut Mesh, chunk_mesh: &ChunkMesh) {
    write_float32x3(mesh, Mesh::ATTRIBUTE_POSITION, chunk_mesh.positions());
    write_float32x3(mesh, Mesh::ATTRIBUTE_NORMAL, chunk_mesh.normals());

    if let Some(VertexAttributeValues::Float32x4(colors)) = mesh.attribute_mut(Mesh::ATTRIBUTE_COLOR) {
        if colors.len() == chunk_mesh.colors().len() {
            colors.copy_from_slice(chunk_mesh.colors());
            return;
        }
    }
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, chunk_mesh.colors().to_vec());
}

fn write_float32x3(mesh: &mut Mesh, attribute: MeshVertexAttribute, values: &[[f32; 3]]) {
    if let Some(VertexAttributeValues::Float32x3(target)) = mesh.attribute_mut(attribute.id) {
        if target.len() == values.len() {
            target.copy_from_slice(values);
            return;
        }
    }
    mesh.insert_attribute(attribute, values.to_vec());
}

/// Mirrors the active chunks into render entities: one mesh entity per chunk,
/// uploaded in full after a topology rebuild and in place after a refresh.
pub fn sync_chunk_meshes(
    mut commands: Commands,
    mut terrain_manager: ResMut<TerrainManager>,
    q_chunks: Query<(Entity, &ChunkCoord, &Handle<Mesh>)>,
    mut meshes: ResMut<Assets<Mesh>>,
    material: Res<TerrainMaterial>,
) {
    let chunk_size = terrain_manager.chunk_size();
    let unit_size = terrain_manager.unit_size();

    let mut rendered = HashMap::new();
    for (entity, coord, handle) in q_chunks.iter() {
        if terrain_manager.contains(coord) {
            rendered.insert(*coord, (entity, handle.clone()));
        } else {
            debug!("Despawning chunk mesh at {:?}", coord);
            commands.entity(entity).despawn_recursive();
        }
    }

    for chunk in terrain_manager.chunks_mut() {
        let coord = chunk.coord();
        let update = chunk.mesh_mut().take_pending_update();

        let Some((entity, handle)) = rendered.get(&coord) else {
            debug!("Spawning chunk mesh at {:?}", coord);
            commands.spawn((
                coord,
                PbrBundle {
                    mesh: meshes.add(build_mesh(chunk.mesh())),
                    material: material.0.clone(),
                    transform: get_chunk_coord_transform(&coord, chunk_size, unit_size, 0.0),
                    ..default()
                },
            ));
            continue;
        };

        match update {
            Some(MeshUpdate::Topology) => {
                meshes.insert(handle.id(), build_mesh(chunk.mesh()));
                commands
                    .entity(*entity)
                    .insert(get_chunk_coord_transform(&coord, chunk_size, unit_size, 0.0));
            }
            Some(MeshUpdate::Heights) => {
                let Some(mesh) = meshes.get_mut(handle.id()) else {
                    warn!("Missing mesh asset for chunk {:?}", coord);
                    continue;
                };
                write_heights(mesh, chunk.mesh());
            }
            None => {}
        }
    }
}
