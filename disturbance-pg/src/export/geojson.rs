//! Export des résultats en GeoJSON avec geozero (streaming)
//!
//! Les features sont écrites au fil du flux, sans matérialiser la
//! collection.

use std::io::Write;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use crate::disturbance::DisturbanceResult;

/// Écrit une FeatureCollection GeoJSON au fil de l'eau
pub struct FeatureCollectionWriter<W: Write> {
    writer: W,
    count: usize,
}

impl<W: Write> FeatureCollectionWriter<W> {
    /// Ouvre la collection (header + CRS)
    pub fn new(mut writer: W) -> Result<Self> {
        write!(
            writer,
            r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::4326"}}}},"features":["#,
        )
        .context("Failed to write FeatureCollection header")?;

        Ok(Self { writer, count: 0 })
    }

    /// Écrit une parcelle perturbée comme Feature
    pub fn write_result(&mut self, result: &DisturbanceResult) -> Result<()> {
        if self.count > 0 {
            write!(self.writer, ",")?;
        }

        write!(
            self.writer,
            r#"{{"type":"Feature","id":"{}","#,
            escape_json(&result.parcel_id)
        )?;

        // Geometry via geozero
        write!(self.writer, r#""geometry":"#)?;
        let mut geom_buf = Vec::new();
        let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
        result.geometry.process_geom(&mut geom_writer)?;
        self.writer.write_all(&geom_buf)?;

        // Properties: id + colonnes calculées
        write!(
            self.writer,
            r#","properties":{{"id":"{}""#,
            escape_json(&result.parcel_id)
        )?;
        for (key, value) in &result.content {
            write!(self.writer, r#","{}":"#, escape_json(key))?;
            serde_json::to_writer(&mut self.writer, value)?;
        }
        write!(self.writer, "}}}}")?;

        self.count += 1;
        Ok(())
    }

    /// Ferme la collection et retourne le nombre de features écrites
    pub fn finish(mut self) -> Result<usize> {
        write!(self.writer, "]}}")?;
        self.writer.flush()?;
        Ok(self.count)
    }
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
