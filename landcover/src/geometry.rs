//! Helpers géométriques pour l'échange avec PostGIS
//!
//! Encodage EWKB (WKB + SRID), décodage WKB, enveloppe monde et
//! validation structurelle avant envoi à PostGIS.

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon, Rect};

use crate::LandcoverError;

/// SRID de stockage des parcelles (WGS84)
pub const WGS84_SRID: u32 = 4326;

/// Enveloppe monde en WGS84, utilisée comme emprise par défaut
pub fn world_envelope() -> Geometry {
    let rect = Rect::new(
        Coord { x: -180.0, y: -90.0 },
        Coord { x: 180.0, y: 90.0 },
    );
    Geometry::Polygon(rect.to_polygon())
}

/// Convertit une géométrie geo en EWKB PostGIS
///
/// Le WKB standard est étendu avec le flag SRID (0x20000000) et le code
/// SRID, dans le byte order du WKB produit.
pub fn geometry_to_ewkb(geom: &Geometry, srid: u32) -> Result<Vec<u8>, LandcoverError> {
    let wkb = wkb::geom_to_wkb(geom).map_err(|e| LandcoverError::Wkb(format!("{:?}", e)))?;

    if wkb.len() < 5 {
        return Err(LandcoverError::Wkb("WKB too short".into()));
    }

    let mut ewkb = Vec::with_capacity(wkb.len() + 4);
    ewkb.push(wkb[0]); // Byte order

    // Type avec flag SRID (0x20000000)
    let type_bytes = [wkb[1], wkb[2], wkb[3], wkb[4]];
    let geom_type = if wkb[0] == 1 {
        // Little endian
        u32::from_le_bytes(type_bytes) | 0x20000000
    } else {
        // Big endian
        u32::from_be_bytes(type_bytes) | 0x20000000
    };

    if wkb[0] == 1 {
        ewkb.extend_from_slice(&geom_type.to_le_bytes());
        ewkb.extend_from_slice(&srid.to_le_bytes());
    } else {
        ewkb.extend_from_slice(&geom_type.to_be_bytes());
        ewkb.extend_from_slice(&srid.to_be_bytes());
    }

    ewkb.extend_from_slice(&wkb[5..]);

    Ok(ewkb)
}

/// Décode un WKB (tel que retourné par `ST_AsBinary`) en géométrie geo
pub fn geometry_from_wkb(bytes: &[u8]) -> Result<Geometry, LandcoverError> {
    let mut reader = bytes;
    wkb::wkb_to_geom(&mut reader).map_err(|e| LandcoverError::Wkb(format!("{:?}", e)))
}

/// Vérifie qu'une géométrie est structurellement acceptable pour PostGIS
///
/// Anneaux fermés d'au moins 4 points, lignes d'au moins 2 points.
pub fn ok_for_postgis(geom: &Geometry) -> bool {
    fn ring_ok(r: &LineString) -> bool {
        if r.0.len() < 4 {
            return false;
        }
        match (r.0.first(), r.0.last()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn polygon_ok(p: &Polygon) -> bool {
        ring_ok(p.exterior()) && p.interiors().iter().all(ring_ok)
    }

    fn multilines_ok(mls: &MultiLineString) -> bool {
        mls.0.iter().all(|ls| ls.0.len() >= 2)
    }

    fn multipoly_ok(mp: &MultiPolygon) -> bool {
        !mp.0.is_empty() && mp.0.iter().all(polygon_ok)
    }

    match geom {
        Geometry::Point(_) => true,
        Geometry::MultiPoint(mp) => !mp.0.is_empty(),
        Geometry::LineString(ls) => ls.0.len() >= 2,
        Geometry::MultiLineString(mls) => multilines_ok(mls),
        Geometry::Polygon(p) => polygon_ok(p),
        Geometry::MultiPolygon(mp) => multipoly_ok(mp),
        Geometry::GeometryCollection(gc) => {
            !gc.0.is_empty() && gc.0.iter().all(ok_for_postgis)
        }
        _ => true,
    }
}
