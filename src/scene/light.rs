use crate::math::Vec3;

/// Light source carried by a scene node.
///
/// All variants carry ambient / diffuse / specular colors stored as RGBA
/// where the alpha channel encodes the intensity; the streamed color is
/// `rgb/255 · a/255`.
#[derive(Debug, Clone)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    /// Wire tag of the variant
    pub fn kind(&self) -> u8 {
        match self {
            Light::Directional(_) => 0,
            Light::Point(_) => 1,
            Light::Spot(_) => 2,
        }
    }

    pub fn ambient_color(&self) -> Vec3 {
        normalize_color(match self {
            Light::Directional(l) => l.ambient,
            Light::Point(l) => l.ambient,
            Light::Spot(l) => l.ambient,
        })
    }

    pub fn diffuse_color(&self) -> Vec3 {
        normalize_color(match self {
            Light::Directional(l) => l.diffuse,
            Light::Point(l) => l.diffuse,
            Light::Spot(l) => l.diffuse,
        })
    }

    pub fn specular_color(&self) -> Vec3 {
        normalize_color(match self {
            Light::Directional(l) => l.specular,
            Light::Point(l) => l.specular,
            Light::Spot(l) => l.specular,
        })
    }
}

/// Sun-style light: parallel rays along `direction`
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: [u8; 4],
    pub diffuse: [u8; 4],
    pub specular: [u8; 4],
}

impl DirectionalLight {
    pub fn new(color: [u8; 3], ambient: u8, diffuse: u8, specular: u8) -> Self {
        Self {
            direction: Vec3::new(-0.2, -1.0, 0.3),
            ambient: with_alpha(color, ambient),
            diffuse: with_alpha(color, diffuse),
            specular: with_alpha(color, specular),
        }
    }
}

/// Omnidirectional light with a falloff radius
#[derive(Debug, Clone)]
pub struct PointLight {
    pub radius: f64,
    pub ambient: [u8; 4],
    pub diffuse: [u8; 4],
    pub specular: [u8; 4],
}

impl PointLight {
    pub fn new(color: [u8; 3], ambient: u8, diffuse: u8, specular: u8) -> Self {
        Self {
            radius: 2.0,
            ambient: with_alpha(color, ambient),
            diffuse: with_alpha(color, diffuse),
            specular: with_alpha(color, specular),
        }
    }
}

/// Cone light with an inner and outer cut-off (stored as cosines)
#[derive(Debug, Clone)]
pub struct SpotLight {
    pub direction: Vec3,
    pub cut_off: f64,
    pub outer_cut_off: f64,
    pub ambient: [u8; 4],
    pub diffuse: [u8; 4],
    pub specular: [u8; 4],
}

impl SpotLight {
    pub fn new(color: [u8; 3], ambient: u8, diffuse: u8, specular: u8) -> Self {
        Self {
            direction: Vec3::new(0.0, -0.2, 1.0),
            cut_off: (12.5_f64.to_radians()).cos(),
            outer_cut_off: (17.5_f64.to_radians()).cos(),
            ambient: with_alpha(color, ambient),
            diffuse: with_alpha(color, diffuse),
            specular: with_alpha(color, specular),
        }
    }
}

fn with_alpha(color: [u8; 3], alpha: u8) -> [u8; 4] {
    [color[0], color[1], color[2], alpha]
}

fn normalize_color(c: [u8; 4]) -> Vec3 {
    let intensity = c[3] as f64 / 255.0;
    Vec3::new(
        c[0] as f64 / 255.0 * intensity,
        c[1] as f64 / 255.0 * intensity,
        c[2] as f64 / 255.0 * intensity,
    )
}
