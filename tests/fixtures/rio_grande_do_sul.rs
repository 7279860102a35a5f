//! Rio Grande do Sul city centres for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap (Nominatim city nodes).

use consultant_dispatch::Coordinates;

/// A named city with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl City {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

pub const PORTO_ALEGRE: City = City::new("Porto Alegre", -30.0346, -51.2177);
pub const CAXIAS_DO_SUL: City = City::new("Caxias do Sul", -29.1678, -51.1794);
pub const PELOTAS: City = City::new("Pelotas", -31.7654, -52.3376);
pub const CANOAS: City = City::new("Canoas", -29.9177, -51.1837);
pub const SANTA_MARIA: City = City::new("Santa Maria", -29.6868, -53.8149);
pub const PASSO_FUNDO: City = City::new("Passo Fundo", -28.2628, -52.4067);

pub const CITIES: &[City] = &[
    PORTO_ALEGRE,
    CAXIAS_DO_SUL,
    PELOTAS,
    CANOAS,
    SANTA_MARIA,
    PASSO_FUNDO,
    City::new("Gravataí", -29.9440, -50.9919),
    City::new("Novo Hamburgo", -29.6783, -51.1309),
    City::new("Rio Grande", -32.0350, -52.0986),
    City::new("Santa Cruz do Sul", -29.7175, -52.4258),
    City::new("Bento Gonçalves", -29.1662, -51.5165),
    City::new("Erechim", -27.6364, -52.2697),
    City::new("Uruguaiana", -29.7614, -57.0853),
    City::new("Santo Ângelo", -28.2994, -54.2630),
    City::new("Bagé", -31.3289, -54.1069),
    City::new("Lajeado", -29.4669, -51.9614),
    City::new("Torres", -29.3353, -49.7269),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_state_bounds() {
        for city in CITIES {
            assert!(city.lat > -33.8 && city.lat < -27.0, "{} lat out of range: {}", city.name, city.lat);
            assert!(city.lng > -57.7 && city.lng < -49.6, "{} lng out of range: {}", city.name, city.lng);
        }
    }
}
