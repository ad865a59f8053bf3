//! Map-link location resolution.
//!
//! Recognises Apple Maps, Google Maps and OpenStreetMap links and reads the
//! coordinates they carry. Links that point at a map but carry no usable
//! coordinates resolve to their own text.

use futures::StreamExt;
use shareprep_core::{LocationResolution, Place};
use url::Url;

use crate::traits::{LocationResolver, LocationStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapProvider {
    Apple,
    Google,
    OpenStreetMap,
}

impl MapProvider {
    fn detect(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(host.as_str());

        if host == "maps.apple.com" {
            return Some(MapProvider::Apple);
        }
        if host.starts_with("maps.google.") || (host == "goo.gl" && url.path().starts_with("/maps")) {
            return Some(MapProvider::Google);
        }
        if host.starts_with("google.") && url.path().starts_with("/maps") {
            return Some(MapProvider::Google);
        }
        if host == "openstreetmap.org" {
            return Some(MapProvider::OpenStreetMap);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MapLinkResolver;

impl MapLinkResolver {
    /// Resolve synchronously; map links never need a network round trip here.
    pub fn resolve_now(url: &str) -> LocationResolution {
        let Ok(parsed) = Url::parse(url) else {
            return LocationResolution::RawText(url.to_string());
        };
        let Some(provider) = MapProvider::detect(&parsed) else {
            return LocationResolution::RawText(url.to_string());
        };

        match provider {
            MapProvider::Apple => apple_place(&parsed),
            MapProvider::Google => google_place(&parsed),
            MapProvider::OpenStreetMap => osm_place(&parsed),
        }
        .map(LocationResolution::Place)
        .unwrap_or_else(|| LocationResolution::RawText(url.to_string()))
    }
}

impl LocationResolver for MapLinkResolver {
    fn is_location_url(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|parsed| MapProvider::detect(&parsed))
            .is_some()
    }

    fn resolve(&self, url: &str) -> LocationStream {
        let resolution = Self::resolve_now(url);
        futures::stream::once(async move { Ok(resolution) }).boxed()
    }
}

fn query(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.trim().is_empty())
}

fn parse_coordinates(value: &str) -> Option<(f64, f64)> {
    let (lat, lon) = value.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().split(',').next()?.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

/// Percent and plus decoding of a single path segment.
fn decode_component(segment: &str) -> String {
    url::form_urlencoded::parse(format!("t={}", segment).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

fn place(coordinates: (f64, f64), title: Option<String>, address: Option<String>) -> Place {
    Place {
        latitude: coordinates.0,
        longitude: coordinates.1,
        title,
        address,
        ..Default::default()
    }
}

fn apple_place(url: &Url) -> Option<Place> {
    let q = query(url, "q");
    if let Some(coordinates) = query(url, "ll").as_deref().and_then(parse_coordinates) {
        return Some(place(coordinates, q, query(url, "address")));
    }
    let coordinates = q.as_deref().and_then(parse_coordinates)?;
    Some(place(coordinates, None, query(url, "address")))
}

fn google_place(url: &Url) -> Option<Place> {
    // /maps/place/<title>/@lat,lon,zoom
    let mut title = None;
    let mut at_coordinates = None;
    if let Some(segments) = url.path_segments() {
        let segments: Vec<&str> = segments.collect();
        for (i, segment) in segments.iter().enumerate() {
            if *segment == "place" {
                title = segments
                    .get(i + 1)
                    .filter(|s| !s.is_empty() && !s.starts_with('@'))
                    .map(|s| decode_component(s));
            }
            if let Some(rest) = segment.strip_prefix('@') {
                at_coordinates = parse_coordinates(rest);
            }
        }
    }

    for key in ["q", "query", "ll"] {
        if let Some(coordinates) = query(url, key).as_deref().and_then(parse_coordinates) {
            return Some(place(coordinates, title, None));
        }
    }

    at_coordinates.map(|coordinates| place(coordinates, title, None))
}

fn osm_place(url: &Url) -> Option<Place> {
    if let (Some(lat), Some(lon)) = (query(url, "mlat"), query(url, "mlon")) {
        return parse_coordinates(&format!("{},{}", lat, lon)).map(|c| place(c, None, None));
    }

    // #map=zoom/lat/lon
    let fragment = url.fragment()?.strip_prefix("map=")?;
    let mut parts = fragment.split('/').skip(1);
    let lat = parts.next()?;
    let lon = parts.next()?;
    parse_coordinates(&format!("{},{}", lat, lon)).map(|c| place(c, None, None))
}
