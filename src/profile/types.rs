//! Enumerations and value types carried by a [`Profile`](super::Profile).

/// ICC device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileType {
    InputDevice,
    DisplayDevice,
    OutputDevice,
    DeviceLink,
    ColorspaceConversion,
    Abstract,
    NamedColor,
    #[default]
    Unknown,
}

impl ProfileType {
    /// Map the header device-class signature.
    pub fn from_signature(sig: [u8; 4]) -> Self {
        match &sig {
            b"scnr" => ProfileType::InputDevice,
            b"mntr" => ProfileType::DisplayDevice,
            b"prtr" => ProfileType::OutputDevice,
            b"link" => ProfileType::DeviceLink,
            b"spac" => ProfileType::ColorspaceConversion,
            b"abst" => ProfileType::Abstract,
            b"nmcl" => ProfileType::NamedColor,
            _ => ProfileType::Unknown,
        }
    }

    pub const fn to_text(self) -> &'static str {
        match self {
            ProfileType::InputDevice => "input-device",
            ProfileType::DisplayDevice => "display-device",
            ProfileType::OutputDevice => "output-device",
            ProfileType::DeviceLink => "devicelink",
            ProfileType::ColorspaceConversion => "colorspace-conversion",
            ProfileType::Abstract => "abstract",
            ProfileType::NamedColor => "named-color",
            ProfileType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_text())
    }
}

/// Color space of the profile's device data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colorspace {
    Xyz,
    Lab,
    Luv,
    YCbCr,
    Yxy,
    Rgb,
    Gray,
    Hsv,
    Cmyk,
    Cmy,
    #[default]
    Unknown,
}

impl Colorspace {
    /// Map the header data-colorspace signature.
    pub fn from_signature(sig: [u8; 4]) -> Self {
        match &sig {
            b"XYZ " => Colorspace::Xyz,
            b"Lab " => Colorspace::Lab,
            b"Luv " => Colorspace::Luv,
            b"YCbr" => Colorspace::YCbCr,
            b"Yxy " => Colorspace::Yxy,
            b"RGB " => Colorspace::Rgb,
            b"GRAY" => Colorspace::Gray,
            b"HSV " => Colorspace::Hsv,
            b"CMYK" => Colorspace::Cmyk,
            b"CMY " => Colorspace::Cmy,
            _ => Colorspace::Unknown,
        }
    }

    pub const fn to_text(self) -> &'static str {
        match self {
            Colorspace::Xyz => "xyz",
            Colorspace::Lab => "lab",
            Colorspace::Luv => "luv",
            Colorspace::YCbCr => "ycbcr",
            Colorspace::Yxy => "yxy",
            Colorspace::Rgb => "rgb",
            Colorspace::Gray => "gray",
            Colorspace::Hsv => "hsv",
            Colorspace::Cmyk => "cmyk",
            Colorspace::Cmy => "cmy",
            Colorspace::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Colorspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_text())
    }
}

/// Three-component color value.
///
/// Holds CIE XYZ for white and black points. For the colorant
/// luminances the components are the xyY chromaticity (`x`, `y`, `Y`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert a tristimulus value to xyY, stored as `(x, y, Y)`.
    ///
    /// A black (all zero) input maps to zero instead of dividing by zero.
    pub fn to_xyy(self) -> Self {
        let sum = self.x + self.y + self.z;
        if sum == 0.0 {
            return Self::default();
        }
        Self::new(self.x / sum, self.y / sum, self.y)
    }
}

impl std::fmt::Display for Xyz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}, {:.6}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_signatures() {
        assert_eq!(ProfileType::from_signature(*b"mntr"), ProfileType::DisplayDevice);
        assert_eq!(ProfileType::from_signature(*b"link"), ProfileType::DeviceLink);
        assert_eq!(ProfileType::from_signature(*b"????"), ProfileType::Unknown);
        assert_eq!(ProfileType::DisplayDevice.to_string(), "display-device");
    }

    #[test]
    fn test_colorspace_signatures() {
        assert_eq!(Colorspace::from_signature(*b"RGB "), Colorspace::Rgb);
        assert_eq!(Colorspace::from_signature(*b"YCbr"), Colorspace::YCbCr);
        assert_eq!(Colorspace::from_signature(*b"rgb "), Colorspace::Unknown);
        assert_eq!(Colorspace::Cmyk.to_text(), "cmyk");
    }

    #[test]
    fn test_xyy_of_srgb_red() {
        // D50-adapted sRGB red colorant
        let red = Xyz::new(0.436066, 0.222488, 0.013916);
        let xyy = red.to_xyy();
        assert!((xyy.x - 0.648454).abs() < 0.001);
        assert!((xyy.z - 0.222488).abs() < 1e-9);
    }

    #[test]
    fn test_xyy_of_black() {
        assert_eq!(Xyz::default().to_xyy(), Xyz::default());
    }
}
