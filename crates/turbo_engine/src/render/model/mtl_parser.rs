//! Wavefront MTL parsing
//!
//! Only the terms that map onto [`Material`] are kept; texture maps are
//! recorded by name but not loaded.

use std::collections::HashMap;

use crate::foundation::math::Vec3;
use crate::render::Material;

/// One `newmtl` block
#[derive(Debug, Clone, PartialEq)]
pub struct MtlEntry {
    /// Material name
    pub name: String,
    /// Diffuse color (Kd)
    pub diffuse: Vec3,
    /// Specular color (Ks)
    pub specular: Vec3,
    /// Emission color (Ke)
    pub emission: Vec3,
    /// Specular exponent (Ns), 0 to 1000
    pub shininess: f32,
    /// Opacity (d, or 1 - Tr)
    pub dissolve: f32,
    /// Diffuse texture (map_Kd)
    pub diffuse_map: Option<String>,
}

impl MtlEntry {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse: Vec3::new(0.8, 0.8, 0.8),
            specular: Vec3::zeros(),
            emission: Vec3::zeros(),
            shininess: 0.0,
            dissolve: 1.0,
            diffuse_map: None,
        }
    }

    /// Convert Phong terms to material factors:
    /// base color = Kd, metallic = mean(Ks), roughness = 1 - Ns/1000, emissive = Ke
    pub fn to_material(&self) -> Material {
        let metallic = (self.specular.x + self.specular.y + self.specular.z) / 3.0;
        let roughness = 1.0 - self.shininess.clamp(0.0, 1000.0) / 1000.0;
        Material::new()
            .with_color(self.diffuse.x, self.diffuse.y, self.diffuse.z)
            .with_metallic(metallic)
            .with_roughness(roughness)
            .with_emissive(self.emission, 1.0)
    }
}

/// Parse MTL text into entries keyed by name.
///
/// Errors name the 1-based line that failed.
pub fn parse_mtl(contents: &str) -> Result<HashMap<String, MtlEntry>, String> {
    let mut entries = HashMap::new();
    let mut current: Option<MtlEntry> = None;

    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        if keyword == "newmtl" {
            if rest.is_empty() {
                return Err(format!("line {line_no}: newmtl without a name"));
            }
            if let Some(done) = current.replace(MtlEntry::named(rest)) {
                entries.insert(done.name.clone(), done);
            }
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        match keyword {
            "Kd" => entry.diffuse = color(rest, line_no)?,
            "Ks" => entry.specular = color(rest, line_no)?,
            "Ke" => entry.emission = color(rest, line_no)?,
            "Ns" => entry.shininess = scalar(rest, line_no)?,
            "d" => entry.dissolve = scalar(rest, line_no)?,
            "Tr" => entry.dissolve = 1.0 - scalar(rest, line_no)?,
            "map_Kd" if !rest.is_empty() => entry.diffuse_map = Some(rest.to_string()),
            _ => {}
        }
    }

    if let Some(done) = current {
        entries.insert(done.name.clone(), done);
    }
    Ok(entries)
}

fn scalar(text: &str, line_no: usize) -> Result<f32, String> {
    let token = text
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("line {line_no}: missing value"))?;
    token
        .parse()
        .map_err(|_| format!("line {line_no}: '{token}' is not a number"))
}

fn color(text: &str, line_no: usize) -> Result<Vec3, String> {
    let values: Vec<f32> = text
        .split_whitespace()
        .map(|t| t.parse().map_err(|_| format!("line {line_no}: '{t}' is not a number")))
        .collect::<Result<_, _>>()?;
    match values.as_slice() {
        [r, g, b, ..] => Ok(Vec3::new(*r, *g, *b)),
        // A single value means grey
        [v] => Ok(Vec3::new(*v, *v, *v)),
        _ => Err(format!("line {line_no}: expected three color components")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_two_materials() {
        let mtl = "
# exported
newmtl Floor
Kd 0.1 0.2 0.3
Ns 500
map_Kd textures/floor tile.png

newmtl Neon
Ke 0.0 1.0 1.0
Tr 0.25
";
        let entries = parse_mtl(mtl).unwrap();
        assert_eq!(entries.len(), 2);
        let floor = &entries["Floor"];
        assert_eq!(floor.diffuse, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(floor.diffuse_map.as_deref(), Some("textures/floor tile.png"));
        let neon = &entries["Neon"];
        assert_eq!(neon.emission, Vec3::new(0.0, 1.0, 1.0));
        assert_relative_eq!(neon.dissolve, 0.75);
    }

    #[test]
    fn test_conversion_to_material() {
        let mut entry = MtlEntry::named("Shiny");
        entry.specular = Vec3::new(0.3, 0.6, 0.9);
        entry.shininess = 750.0;
        entry.emission = Vec3::new(1.0, 0.0, 0.0);
        let material = entry.to_material();
        assert_relative_eq!(material.metallic, 0.6);
        assert_relative_eq!(material.roughness, 0.25);
        assert_eq!(material.emissive, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(material.base_color, Vec3::new(0.8, 0.8, 0.8));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_mtl("newmtl A\nKd 1 x 1\n").unwrap_err();
        assert!(err.starts_with("line 2"));
    }

    #[test]
    fn test_statements_before_newmtl_are_ignored() {
        let entries = parse_mtl("Kd 1 1 1\nnewmtl A\n").unwrap();
        assert_eq!(entries["A"].diffuse, Vec3::new(0.8, 0.8, 0.8));
    }
}
