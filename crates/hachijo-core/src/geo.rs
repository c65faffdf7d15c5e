//! Fixed forecast points around Hachijojima.

/// A named latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// Representative point for island-wide wind readings.
pub const HACHIJO_TOWN_OFFICE: GeoPoint = GeoPoint {
    name: "Hachijo Town Office",
    lat: 33.1136,
    lon: 139.7876,
};

/// Nearest open-water point to 底土 port.
pub const SOKODO_BEACH: GeoPoint = GeoPoint {
    name: "Sokodo Beach",
    lat: 33.1239,
    lon: 139.7819,
};

/// Nearest open-water point to 八重根 port.
pub const YAENE_PORT: GeoPoint = GeoPoint {
    name: "Yaene Port",
    lat: 33.1075,
    lon: 139.7729,
};
