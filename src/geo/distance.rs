use crate::config::EARTH_RADIUS_KM;
use crate::types::LatLng;

/// Approximate centroids keyed by the first two digits of a Dutch postal code.
const POSTAL_REGIONS: &[(&str, LatLng)] = &[
    ("10", LatLng::new(52.3676, 4.9041)),  // Amsterdam
    ("11", LatLng::new(52.3105, 4.9730)),  // Amsterdam-Zuidoost / Amstelveen
    ("12", LatLng::new(52.2292, 5.1669)),  // Hilversum
    ("13", LatLng::new(52.3508, 5.2647)),  // Almere
    ("14", LatLng::new(52.5050, 4.9597)),  // Purmerend
    ("15", LatLng::new(52.4420, 4.8292)),  // Zaandam
    ("16", LatLng::new(52.6424, 5.0602)),  // Hoorn
    ("17", LatLng::new(52.6700, 4.8300)),  // Heerhugowaard
    ("18", LatLng::new(52.6324, 4.7534)),  // Alkmaar
    ("19", LatLng::new(52.4833, 4.6569)),  // Beverwijk
    ("20", LatLng::new(52.3874, 4.6462)),  // Haarlem
    ("21", LatLng::new(52.3030, 4.6890)),  // Hoofddorp
    ("22", LatLng::new(52.2000, 4.4167)),  // Katwijk
    ("23", LatLng::new(52.1601, 4.4970)),  // Leiden
    ("24", LatLng::new(52.1292, 4.6550)),  // Alphen aan den Rijn
    ("25", LatLng::new(52.0705, 4.3007)),  // Den Haag
    ("26", LatLng::new(52.0116, 4.3571)),  // Delft
    ("27", LatLng::new(52.0575, 4.4931)),  // Zoetermeer
    ("28", LatLng::new(52.0115, 4.7105)),  // Gouda
    ("29", LatLng::new(51.9292, 4.5778)),  // Capelle aan den IJssel
    ("30", LatLng::new(51.9244, 4.4777)),  // Rotterdam
    ("31", LatLng::new(51.9192, 4.3989)),  // Schiedam
    ("32", LatLng::new(51.8447, 4.3298)),  // Spijkenisse
    ("33", LatLng::new(51.8133, 4.6901)),  // Dordrecht
    ("34", LatLng::new(52.0297, 5.0810)),  // Nieuwegein
    ("35", LatLng::new(52.0907, 5.1214)),  // Utrecht
    ("37", LatLng::new(52.0890, 5.2333)),  // Zeist
    ("38", LatLng::new(52.1561, 5.3878)),  // Amersfoort
    ("39", LatLng::new(52.0287, 5.5590)),  // Veenendaal
    ("44", LatLng::new(51.5040, 3.8880)),  // Goes
    ("46", LatLng::new(51.4949, 4.2911)),  // Bergen op Zoom
    ("48", LatLng::new(51.5719, 4.7683)),  // Breda
    ("50", LatLng::new(51.5555, 5.0913)),  // Tilburg
    ("52", LatLng::new(51.6978, 5.3037)),  // 's-Hertogenbosch
    ("56", LatLng::new(51.4416, 5.4697)),  // Eindhoven
    ("57", LatLng::new(51.4793, 5.6570)),  // Helmond
    ("59", LatLng::new(51.3704, 6.1724)),  // Venlo
    ("62", LatLng::new(50.8514, 5.6910)),  // Maastricht
    ("64", LatLng::new(50.8882, 5.9795)),  // Heerlen
    ("65", LatLng::new(51.8126, 5.8372)),  // Nijmegen
    ("68", LatLng::new(51.9851, 5.8987)),  // Arnhem
    ("73", LatLng::new(52.2112, 5.9699)),  // Apeldoorn
    ("74", LatLng::new(52.2550, 6.1639)),  // Deventer
    ("75", LatLng::new(52.2215, 6.8937)),  // Enschede
    ("80", LatLng::new(52.5168, 6.0830)),  // Zwolle
    ("82", LatLng::new(52.5185, 5.4714)),  // Lelystad
    ("89", LatLng::new(53.2012, 5.7999)),  // Leeuwarden
    ("94", LatLng::new(52.9925, 6.5649)),  // Assen
    ("97", LatLng::new(53.2194, 6.5665)),  // Groningen
];

const CITIES: &[(&str, LatLng)] = &[
    ("amsterdam", LatLng::new(52.3676, 4.9041)),
    ("rotterdam", LatLng::new(51.9244, 4.4777)),
    ("den haag", LatLng::new(52.0705, 4.3007)),
    ("'s-gravenhage", LatLng::new(52.0705, 4.3007)),
    ("utrecht", LatLng::new(52.0907, 5.1214)),
    ("eindhoven", LatLng::new(51.4416, 5.4697)),
    ("groningen", LatLng::new(53.2194, 6.5665)),
    ("tilburg", LatLng::new(51.5555, 5.0913)),
    ("almere", LatLng::new(52.3508, 5.2647)),
    ("breda", LatLng::new(51.5719, 4.7683)),
    ("nijmegen", LatLng::new(51.8126, 5.8372)),
    ("apeldoorn", LatLng::new(52.2112, 5.9699)),
    ("haarlem", LatLng::new(52.3874, 4.6462)),
    ("arnhem", LatLng::new(51.9851, 5.8987)),
    ("enschede", LatLng::new(52.2215, 6.8937)),
    ("amersfoort", LatLng::new(52.1561, 5.3878)),
    ("zwolle", LatLng::new(52.5168, 6.0830)),
    ("leiden", LatLng::new(52.1601, 4.4970)),
    ("maastricht", LatLng::new(50.8514, 5.6910)),
    ("dordrecht", LatLng::new(51.8133, 4.6901)),
];

/// Resolve a free-text location term to approximate coordinates: postal region
/// first (first 4-digit run, keyed on its leading two digits), then an exact
/// city name. `None` means distance filtering cannot apply.
pub fn resolve(term: &str) -> Option<LatLng> {
    postal_prefix(term)
        .and_then(|prefix| {
            POSTAL_REGIONS
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, at)| *at)
        })
        .or_else(|| {
            let name = term.trim().to_lowercase();
            CITIES.iter().find(|(c, _)| *c == name).map(|(_, at)| *at)
        })
}

fn postal_prefix(term: &str) -> Option<&str> {
    let bytes = term.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .map(|start| &term[start..start + 2])
}

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMSTERDAM: LatLng = LatLng::new(52.3676, 4.9041);
    const ROTTERDAM: LatLng = LatLng::new(51.9244, 4.4777);
    const UTRECHT: LatLng = LatLng::new(52.0907, 5.1214);

    #[test]
    fn postal_code_resolves_to_region() {
        assert_eq!(resolve("1012"), Some(AMSTERDAM));
        assert_eq!(resolve("1012 AB"), Some(AMSTERDAM));
        assert_eq!(resolve("postcode 3011XX"), Some(ROTTERDAM));
    }

    #[test]
    fn city_name_fallback_is_exact_and_case_insensitive() {
        assert_eq!(resolve("  Utrecht "), Some(UTRECHT));
        assert_eq!(resolve("Den Haag"), resolve("2511"));
        assert!(resolve("Utrechtseweg").is_none());
    }

    #[test]
    fn unknown_terms_resolve_to_none() {
        assert!(resolve("Nergenshuizen").is_none());
        assert!(resolve("9999").is_none());
        assert!(resolve("").is_none());
        assert!(resolve("123").is_none());
    }

    #[test]
    fn unknown_postal_region_falls_back_to_city() {
        // "0000" has no region; the whole term is not a city either.
        assert!(resolve("0000 amsterdam").is_none());
        assert_eq!(resolve("amsterdam"), Some(AMSTERDAM));
    }

    #[test]
    fn haversine_properties() {
        assert_eq!(distance_km(AMSTERDAM, AMSTERDAM), 0.0);
        let ar = distance_km(AMSTERDAM, ROTTERDAM);
        assert!((ar - 57.0).abs() <= 3.0, "amsterdam-rotterdam = {ar}");
        assert!((ar - distance_km(ROTTERDAM, AMSTERDAM)).abs() < 1e-9);
        let via = distance_km(AMSTERDAM, UTRECHT) + distance_km(UTRECHT, ROTTERDAM);
        assert!(ar <= via + 1e-9);
    }
}
