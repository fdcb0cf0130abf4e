// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ loader using nom
//!
//! Supports positions, normals, texture coordinates, polygonal faces with
//! every index form (negative indices included), polylines, `o`/`g` names,
//! and materials read from MTL libraries. Unknown statements are skipped.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use nalgebra::{Point2, Point3, Vector3};
use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of, space1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::separated_list1,
    sequence::{pair, preceded, tuple},
    IResult,
};
use rustc_hash::FxHashMap;
use sh3d_scene::{Appearance, GeometryArray, SceneGraph, Shape, TextureImage};
use smallvec::SmallVec;

use super::{LoadCallbacks, ModelLoader};
use crate::content::{resolve_url, ContentReader};
use crate::error::{ModelError, Result};
use crate::observer::LoadPhase;
use crate::tasks::TaskQueue;

/// Corner of an OBJ face, with 0-based indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjVertex {
    pub position: u32,
    pub texture_coordinate: Option<u32>,
    pub normal: Option<u32>,
}

pub type ObjFace = SmallVec<[ObjVertex; 4]>;

/// Faces and polylines sharing one name and one material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjGroup {
    pub name: Option<String>,
    pub material: Option<String>,
    pub faces: Vec<ObjFace>,
    /// Polylines as position indices
    pub lines: Vec<SmallVec<[u32; 4]>>,
}

impl ObjGroup {
    fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.lines.is_empty()
    }
}

/// Parsed OBJ content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub positions: Vec<Point3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub texture_coordinates: Vec<Point2<f32>>,
    pub material_libraries: Vec<String>,
    pub groups: Vec<ObjGroup>,
}

/// Material of an MTL library
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMaterial {
    pub name: String,
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub transparency: Option<f32>,
    /// Diffuse texture file, relative to the library
    pub diffuse_map: Option<String>,
}

/// Syntax error in an OBJ file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ObjParseError {
    pub line: usize,
    pub message: String,
}

impl ObjParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parse float: 1, -1.5, .5, 1e-3, 2.E+4
fn float(input: &str) -> IResult<&str, f32> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f32>(),
    )(input)
}

/// Parse index: 12, -1
fn index(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i64>())(input)
}

/// Parse face vertex: v, v/vt, v//vn, v/vt/vn
fn face_vertex(input: &str) -> IResult<&str, (i64, Option<i64>, Option<i64>)> {
    map(
        tuple((
            index,
            opt(preceded(char('/'), opt(index))),
            opt(preceded(char('/'), index)),
        )),
        |(v, vt, vn)| (v, vt.flatten(), vn),
    )(input)
}

fn floats(input: &str) -> Option<Vec<f32>> {
    all_consuming(separated_list1(space1, float))(input)
        .ok()
        .map(|(_, values)| values)
}

fn face_vertices(input: &str) -> Option<Vec<(i64, Option<i64>, Option<i64>)>> {
    all_consuming(separated_list1(space1, face_vertex))(input)
        .ok()
        .map(|(_, vertices)| vertices)
}

/// Converts a 1-based or negative relative OBJ index to a 0-based index
fn resolve_index(index: i64, count: usize, element: &str, line: usize) -> std::result::Result<u32, ObjParseError> {
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => count as i64 + i,
        _ => -1,
    };
    if resolved < 0 || resolved >= count as i64 {
        return Err(ObjParseError::new(
            line,
            format!("{element} index {index} out of range ({count} defined)"),
        ));
    }
    Ok(resolved as u32)
}

/// Splits text in statements, joining lines continued with a backslash
/// and dropping comments. Each statement comes with its first line number.
fn statements(text: &str) -> Vec<(usize, String)> {
    let mut statements = Vec::new();
    let mut pending = String::new();
    let mut first_line = 0;
    for (number, line) in text.lines().enumerate() {
        let line = match line.find('#') {
            Some(hash) => &line[..hash],
            None => line,
        };
        if pending.is_empty() {
            first_line = number + 1;
        }
        let trimmed = line.trim_end();
        if let Some(continued) = trimmed.strip_suffix('\\') {
            pending.push_str(continued);
            pending.push(' ');
            continue;
        }
        pending.push_str(trimmed);
        let statement = pending.trim();
        if !statement.is_empty() {
            statements.push((first_line, statement.to_string()));
        }
        pending.clear();
    }
    let statement = pending.trim();
    if !statement.is_empty() {
        statements.push((first_line, statement.to_string()));
    }
    statements
}

fn split_keyword(statement: &str) -> (&str, &str) {
    statement
        .split_once(|c: char| c.is_ascii_whitespace())
        .map(|(keyword, rest)| (keyword, rest.trim()))
        .unwrap_or((statement, ""))
}

/// Parses OBJ text.
pub fn parse_obj(text: &str) -> std::result::Result<ObjModel, ObjParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut model = ObjModel {
        groups: vec![ObjGroup::default()],
        ..ObjModel::default()
    };

    for (line, statement) in statements(text) {
        let (keyword, rest) = split_keyword(&statement);
        match keyword {
            "v" => {
                let values = floats(rest)
                    .filter(|values| values.len() >= 3)
                    .ok_or_else(|| ObjParseError::new(line, "invalid vertex"))?;
                model.positions.push(Point3::new(values[0], values[1], values[2]));
            }
            "vn" => {
                let values = floats(rest)
                    .filter(|values| values.len() >= 3)
                    .ok_or_else(|| ObjParseError::new(line, "invalid normal"))?;
                model.normals.push(Vector3::new(values[0], values[1], values[2]));
            }
            "vt" => {
                let values = floats(rest).ok_or_else(|| ObjParseError::new(line, "invalid texture coordinate"))?;
                model
                    .texture_coordinates
                    .push(Point2::new(values[0], values.get(1).copied().unwrap_or(0.0)));
            }
            "f" => {
                let vertices = face_vertices(rest)
                    .filter(|vertices| vertices.len() >= 3)
                    .ok_or_else(|| ObjParseError::new(line, "invalid face"))?;
                let mut face = ObjFace::new();
                for (v, vt, vn) in vertices {
                    face.push(ObjVertex {
                        position: resolve_index(v, model.positions.len(), "vertex", line)?,
                        texture_coordinate: vt
                            .map(|vt| resolve_index(vt, model.texture_coordinates.len(), "texture coordinate", line))
                            .transpose()?,
                        normal: vn
                            .map(|vn| resolve_index(vn, model.normals.len(), "normal", line))
                            .transpose()?,
                    });
                }
                current_group(&mut model).faces.push(face);
            }
            "l" => {
                let vertices = face_vertices(rest)
                    .filter(|vertices| vertices.len() >= 2)
                    .ok_or_else(|| ObjParseError::new(line, "invalid line"))?;
                let polyline = vertices
                    .into_iter()
                    .map(|(v, _, _)| resolve_index(v, model.positions.len(), "vertex", line))
                    .collect::<std::result::Result<SmallVec<[u32; 4]>, _>>()?;
                current_group(&mut model).lines.push(polyline);
            }
            "o" | "g" => {
                let name = (!rest.is_empty()).then(|| rest.to_string());
                let material = current_group(&mut model).material.clone();
                start_group(&mut model, name, material);
            }
            "usemtl" => {
                let name = current_group(&mut model).name.clone();
                let material = (!rest.is_empty()).then(|| rest.to_string());
                start_group(&mut model, name, material);
            }
            "mtllib" => {
                model
                    .material_libraries
                    .extend(rest.split_ascii_whitespace().map(str::to_string));
            }
            _ => {}
        }
    }

    model.groups.retain(|group| !group.is_empty());
    Ok(model)
}

fn current_group(model: &mut ObjModel) -> &mut ObjGroup {
    if model.groups.is_empty() {
        model.groups.push(ObjGroup::default());
    }
    let last = model.groups.len() - 1;
    &mut model.groups[last]
}

fn start_group(model: &mut ObjModel, name: Option<String>, material: Option<String>) {
    let group = current_group(model);
    if group.is_empty() {
        group.name = name;
        group.material = material;
    } else {
        model.groups.push(ObjGroup {
            name,
            material,
            ..ObjGroup::default()
        });
    }
}

fn color(rest: &str) -> Option<[f32; 3]> {
    floats(rest).filter(|values| values.len() >= 3).map(|v| [v[0], v[1], v[2]])
}

fn single_float(rest: &str) -> Option<f32> {
    floats(rest).and_then(|values| values.first().copied())
}

/// Parses an MTL library. Malformed statements are skipped.
pub fn parse_mtl(text: &str) -> Vec<ObjMaterial> {
    let mut materials: Vec<ObjMaterial> = Vec::new();
    for (line, statement) in statements(text) {
        let (keyword, rest) = split_keyword(&statement);
        if keyword == "newmtl" {
            materials.push(ObjMaterial {
                name: rest.to_string(),
                ..ObjMaterial::default()
            });
            continue;
        }
        let Some(material) = materials.last_mut() else {
            continue;
        };
        let parsed = match keyword {
            "Ka" => color(rest).map(|c| material.ambient = Some(c)),
            "Kd" => color(rest).map(|c| material.diffuse = Some(c)),
            "Ks" => color(rest).map(|c| material.specular = Some(c)),
            "Ns" => single_float(rest).map(|ns| material.shininess = Some(ns)),
            "d" => single_float(rest).map(|d| material.transparency = Some(1.0 - d)),
            "Tr" => single_float(rest).map(|tr| material.transparency = Some(tr)),
            // Options come first, the file name is last
            "map_Kd" => rest
                .split_ascii_whitespace()
                .last()
                .map(|file| material.diffuse_map = Some(file.to_string())),
            _ => Some(()),
        };
        if parsed.is_none() {
            tracing::debug!(line, statement = %statement, "Skipping malformed MTL statement");
        }
    }
    materials
}

fn remap<T: Copy>(
    map: &mut FxHashMap<u32, u32>,
    local: &mut Vec<T>,
    global: &[T],
    buffer: &'static str,
    index: u32,
) -> Result<u32> {
    if let Some(&remapped) = map.get(&index) {
        return Ok(remapped);
    }
    let value = global.get(index as usize).copied().ok_or(sh3d_scene::Error::IndexOutOfBounds {
        buffer,
        index,
        len: global.len(),
    })?;
    local.push(value);
    let remapped = (local.len() - 1) as u32;
    map.insert(index, remapped);
    Ok(remapped)
}

fn triangle_geometry(model: &ObjModel, faces: &[ObjFace]) -> Result<GeometryArray> {
    let corners = || faces.iter().flat_map(|face| face.iter());
    let has_normals = corners().all(|v| v.normal.is_some());
    let has_texture_coordinates = corners().all(|v| v.texture_coordinate.is_some());

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texture_coordinates = Vec::new();
    let mut position_map = FxHashMap::default();
    let mut normal_map = FxHashMap::default();
    let mut texture_coordinate_map = FxHashMap::default();
    let mut vertex_indices = Vec::new();
    let mut normal_indices = Vec::new();
    let mut texture_coordinate_indices = Vec::new();

    for face in faces {
        // Fan triangulation, faces are expected to be convex.
        // Faces with less than 3 vertices give no triangle.
        for k in 1..face.len().saturating_sub(1) {
            for vertex in [face[0], face[k], face[k + 1]] {
                vertex_indices.push(remap(
                    &mut position_map,
                    &mut positions,
                    &model.positions,
                    "position",
                    vertex.position,
                )?);
                if let (true, Some(normal)) = (has_normals, vertex.normal) {
                    normal_indices.push(remap(&mut normal_map, &mut normals, &model.normals, "normal", normal)?);
                }
                if let (true, Some(texture_coordinate)) = (has_texture_coordinates, vertex.texture_coordinate) {
                    texture_coordinate_indices.push(remap(
                        &mut texture_coordinate_map,
                        &mut texture_coordinates,
                        &model.texture_coordinates,
                        "texture coordinate",
                        texture_coordinate,
                    )?);
                }
            }
        }
    }

    let mut geometry = GeometryArray::triangles(positions, vertex_indices)?;
    if has_normals {
        geometry = geometry.with_normals(normals, normal_indices)?;
    }
    if has_texture_coordinates {
        geometry = geometry.with_texture_coordinates(texture_coordinates, texture_coordinate_indices)?;
    }
    Ok(geometry)
}

fn line_geometry(model: &ObjModel, lines: &[SmallVec<[u32; 4]>]) -> Result<GeometryArray> {
    let mut positions = Vec::new();
    let mut position_map = FxHashMap::default();
    let mut vertex_indices = Vec::new();
    for polyline in lines {
        for segment in polyline.windows(2) {
            for &position in segment {
                vertex_indices.push(remap(&mut position_map, &mut positions, &model.positions, "position", position)?);
            }
        }
    }
    Ok(GeometryArray::lines(positions, vertex_indices)?)
}

/// Builds a scene with one shape per group, named after the group.
pub fn build_scene(model: &ObjModel, appearances: &FxHashMap<String, Appearance>) -> Result<SceneGraph> {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    for group in &model.groups {
        let mut geometries: SmallVec<[Arc<GeometryArray>; 1]> = SmallVec::new();
        if !group.faces.is_empty() {
            geometries.push(Arc::new(triangle_geometry(model, &group.faces)?));
        }
        if !group.lines.is_empty() {
            geometries.push(Arc::new(line_geometry(model, &group.lines)?));
        }
        if geometries.is_empty() {
            continue;
        }
        let appearance = group.material.as_ref().map(|material| {
            appearances
                .get(material)
                .cloned()
                .unwrap_or_else(|| Appearance::named(material.as_str()))
        });
        let shape = graph.add_shape(Shape {
            geometries,
            appearance,
        });
        if let Some(name) = &group.name {
            graph.set_name(shape, name.as_str())?;
        }
        graph.append_child(root, shape)?;
    }
    Ok(graph)
}

/// Loader of Wavefront OBJ contents.
#[derive(Clone)]
pub struct ObjLoader {
    inner: Rc<ObjLoaderInner>,
}

struct ObjLoaderInner {
    reader: Rc<dyn ContentReader>,
    tasks: TaskQueue,
    /// Texture images shared by the models of this loader
    texture_images: RefCell<FxHashMap<String, Arc<TextureImage>>>,
}

impl ObjLoader {
    /// Create a loader reading contents with `reader`, asynchronous loads
    /// being run by `tasks`.
    pub fn new(reader: Rc<dyn ContentReader>, tasks: TaskQueue) -> Self {
        Self {
            inner: Rc::new(ObjLoaderInner {
                reader,
                tasks,
                texture_images: RefCell::new(FxHashMap::default()),
            }),
        }
    }
}

impl ModelLoader for ObjLoader {
    fn name(&self) -> &str {
        "obj"
    }

    fn load(&self, url: &str, synchronous: bool, callbacks: LoadCallbacks) {
        if synchronous {
            self.inner.load_now(url, callbacks);
        } else {
            let inner = Rc::clone(&self.inner);
            let url = url.to_string();
            self.inner.tasks.post(move || inner.load_now(&url, callbacks));
        }
    }

    fn clear(&self) {
        self.inner.texture_images.borrow_mut().clear();
    }
}

impl ObjLoaderInner {
    fn load_now(&self, url: &str, mut callbacks: LoadCallbacks) {
        match self.read_model(url, &mut callbacks) {
            Ok(graph) => callbacks.model_loaded(graph),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "OBJ loader rejected content");
                callbacks.model_error(e);
            }
        }
    }

    fn read_model(&self, url: &str, callbacks: &mut LoadCallbacks) -> Result<SceneGraph> {
        callbacks.progression(LoadPhase::Reading, url, 0.0);
        let bytes = self.reader.read(url)?;
        let text = std::str::from_utf8(&bytes[..]).map_err(|_| ModelError::format(url, "not a text content"))?;

        callbacks.progression(LoadPhase::Parsing, url, 0.25);
        let model = parse_obj(text).map_err(|e| ModelError::format(url, e.to_string()))?;

        callbacks.progression(LoadPhase::Building, url, 0.5);
        let appearances = self.read_materials(url, &model.material_libraries);
        let graph = build_scene(&model, &appearances)?;

        callbacks.progression(LoadPhase::Binding, url, 1.0);
        Ok(graph)
    }

    fn read_materials(&self, url: &str, libraries: &[String]) -> FxHashMap<String, Appearance> {
        let mut appearances = FxHashMap::default();
        for library in libraries {
            let library_url = resolve_url(url, library);
            match self.reader.read(&library_url) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes[..]);
                    for material in parse_mtl(&text) {
                        let appearance = self.appearance(&library_url, &material);
                        appearances.insert(material.name, appearance);
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %library_url, error = %e, "Failed to read material library");
                }
            }
        }
        appearances
    }

    fn appearance(&self, library_url: &str, material: &ObjMaterial) -> Appearance {
        Appearance {
            name: Some(material.name.clone()),
            ambient_color: material.ambient,
            diffuse_color: material.diffuse,
            specular_color: material.specular,
            shininess: material.shininess,
            transparency: material.transparency,
            texture_image: material
                .diffuse_map
                .as_deref()
                .map(|map| self.texture_image(&resolve_url(library_url, map))),
            ..Appearance::default()
        }
    }

    fn texture_image(&self, url: &str) -> Arc<TextureImage> {
        self.texture_images
            .borrow_mut()
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(TextureImage::new(url)))
            .clone()
    }
}
