//! End-to-end profile decoding against synthetic ICC files.

use colorcal::error::ParseError;
use colorcal::profile::{Colorspace, Profile, ProfileDecoder, ProfileType, scan_profiles};

// =============================================================================
// ICC Writer
// =============================================================================

/// Minimal ICC v2 writer: header, tag table and 4-byte aligned tag data.
struct IccBuilder {
    class: [u8; 4],
    colorspace: [u8; 4],
    date: [u16; 6],
    tags: Vec<([u8; 4], Vec<u8>)>,
}

impl IccBuilder {
    fn new(class: &[u8; 4], colorspace: &[u8; 4]) -> Self {
        Self {
            class: *class,
            colorspace: *colorspace,
            date: [1998, 2, 9, 6, 49, 0],
            tags: Vec::new(),
        }
    }

    fn tag(mut self, sig: &[u8; 4], data: Vec<u8>) -> Self {
        self.tags.push((*sig, data));
        self
    }

    fn desc(self, sig: &[u8; 4], text: &str) -> Self {
        let mut data = b"desc\0\0\0\0".to_vec();
        data.extend_from_slice(&(text.len() as u32 + 1).to_be_bytes());
        data.extend_from_slice(text.as_bytes());
        data.push(0);
        // empty unicode and scriptcode parts
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&[0; 3 + 67]);
        self.tag(sig, data)
    }

    fn text(self, sig: &[u8; 4], text: &str) -> Self {
        let mut data = b"text\0\0\0\0".to_vec();
        data.extend_from_slice(text.as_bytes());
        data.push(0);
        self.tag(sig, data)
    }

    fn xyz(self, sig: &[u8; 4], x: f64, y: f64, z: f64) -> Self {
        let mut data = b"XYZ \0\0\0\0".to_vec();
        for v in [x, y, z] {
            data.extend_from_slice(&((v * 65536.0).round() as i32).to_be_bytes());
        }
        self.tag(sig, data)
    }

    fn gamma(self, sig: &[u8; 4], gamma: f64) -> Self {
        let mut data = b"curv\0\0\0\0".to_vec();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&((gamma * 256.0).round() as u16).to_be_bytes());
        self.tag(sig, data)
    }

    fn vcgt_table(self, channel: &[u16]) -> Self {
        let mut data = b"vcgt\0\0\0\0".to_vec();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(&(channel.len() as u16).to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        for _ in 0..3 {
            for v in channel {
                data.extend_from_slice(&v.to_be_bytes());
            }
        }
        self.tag(b"vcgt", data)
    }

    fn build(self) -> Vec<u8> {
        let table_len = 4 + 12 * self.tags.len();
        let mut offset = 128 + table_len;
        let mut table = Vec::new();
        let mut payload = Vec::new();

        table.extend_from_slice(&(self.tags.len() as u32).to_be_bytes());
        for (sig, data) in &self.tags {
            table.extend_from_slice(sig);
            table.extend_from_slice(&(offset as u32).to_be_bytes());
            table.extend_from_slice(&(data.len() as u32).to_be_bytes());
            payload.extend_from_slice(data);
            while payload.len() % 4 != 0 {
                payload.push(0);
            }
            offset = 128 + table_len + payload.len();
        }

        let mut header = vec![0u8; 128];
        header[8..12].copy_from_slice(&[0x02, 0x10, 0, 0]);
        header[12..16].copy_from_slice(&self.class);
        header[16..20].copy_from_slice(&self.colorspace);
        header[20..24].copy_from_slice(b"XYZ ");
        for (i, field) in self.date.iter().enumerate() {
            header[24 + i * 2..26 + i * 2].copy_from_slice(&field.to_be_bytes());
        }
        header[36..40].copy_from_slice(b"acsp");

        let mut out = header;
        out.extend_from_slice(&table);
        out.extend_from_slice(&payload);
        let size = out.len() as u32;
        out[0..4].copy_from_slice(&size.to_be_bytes());
        out
    }
}

fn bluish() -> Vec<u8> {
    IccBuilder::new(b"mntr", b"RGB ")
        .desc(b"desc", "Blueish Test")
        .text(b"cprt", "Copyright (c) 1998 Hewlett-Packard Company")
        .desc(b"dmnd", "IEC http://www.iec.ch")
        .desc(b"dmdd", "IEC 61966-2.1 Default RGB colour space - sRGB")
        .xyz(b"wtpt", 0.9642, 1.0, 0.8249)
        .xyz(b"bkpt", 0.0, 0.0, 0.0)
        .xyz(b"rXYZ", 0.4361, 0.2225, 0.0139)
        .xyz(b"gXYZ", 0.3851, 0.7169, 0.0971)
        .xyz(b"bXYZ", 0.1431, 0.0606, 0.7141)
        .gamma(b"rTRC", 2.2)
        .gamma(b"gTRC", 2.2)
        .gamma(b"bTRC", 2.2)
        .build()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_bluish_metadata() {
    let data = bluish();
    let profile = Profile::parse(&data).unwrap();

    assert_eq!(profile.size(), data.len());
    assert_eq!(profile.profile_type(), ProfileType::DisplayDevice);
    assert_eq!(profile.colorspace(), Colorspace::Rgb);
    assert_eq!(profile.description(), "Blueish Test");
    assert_eq!(
        profile.copyright(),
        Some("Copyright (c) 1998 Hewlett-Packard Company")
    );
    assert_eq!(profile.manufacturer(), Some("IEC http://www.iec.ch"));
    assert_eq!(
        profile.model(),
        Some("IEC 61966-2.1 Default RGB colour space - sRGB")
    );
    assert_eq!(profile.datetime(), Some("9 February 1998, 06:49:00"));
    assert!((profile.luminance_red().x - 0.648).abs() < 0.001);
    assert!((profile.white_point().x - 0.9642).abs() < 1e-4);
    assert_eq!(profile.profile_type().to_string(), "display-device");
}

#[test]
fn test_from_path_records_filename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bluish.icc");
    std::fs::write(&path, bluish()).unwrap();

    let profile = Profile::from_path(&path).unwrap();
    assert_eq!(profile.filename(), Some(path.as_path()));
    assert_eq!(profile.description(), "Blueish Test");
}

#[test]
fn test_empty_description_uses_basename() {
    let data = IccBuilder::new(b"mntr", b"RGB ").desc(b"desc", "").build();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Office Monitor.icm");
    std::fs::write(&path, &data).unwrap();

    let profile = Profile::from_path(&path).unwrap();
    assert_eq!(profile.description(), "Office Monitor.icm");

    let profile = Profile::parse(&data).unwrap();
    assert_eq!(profile.description(), "Missing description");
}

#[test]
fn test_long_description_is_capped() {
    let long = "A".repeat(200);
    let data = IccBuilder::new(b"prtr", b"CMYK").desc(b"desc", &long).build();
    let profile = Profile::parse(&data).unwrap();
    assert_eq!(profile.description().len(), 80);
    assert_eq!(profile.profile_type(), ProfileType::OutputDevice);
    assert_eq!(profile.colorspace(), Colorspace::Cmyk);
}

#[test]
fn test_truncated_is_malformed() {
    let data = bluish();
    let err = Profile::parse(&data[..100]).unwrap_err();
    assert!(matches!(err, ParseError::Malformed { .. }));
}

#[test]
fn test_no_backend() {
    let err = ProfileDecoder::without_backend().parse(&bluish()).unwrap_err();
    assert!(matches!(err, ParseError::NoSupport));
}

#[test]
fn test_curve_from_trc() {
    let profile = Profile::parse(&bluish()).unwrap();
    let curve = profile.generate_curve(256).unwrap();
    assert_eq!(curve.len(), 256);
    assert_eq!(curve.entries()[0].red, 0);
    assert_eq!(curve.entries()[255].blue, 65535);
    let mid = curve.entries()[128].green as f64 / 65535.0;
    assert!((mid - (128.0f64 / 255.0).powf(2.19921875)).abs() < 1e-3);
    assert!(profile.generate_vcgt(256).is_none());
}

#[test]
fn test_gray_curve_replicates() {
    let data = IccBuilder::new(b"mntr", b"GRAY").gamma(b"kTRC", 1.8).build();
    let curve = Profile::parse(&data).unwrap().generate_curve(16).unwrap();
    for entry in curve.entries() {
        assert_eq!(entry.red, entry.green);
        assert_eq!(entry.green, entry.blue);
    }
}

#[test]
fn test_vcgt_resampled() {
    let data = IccBuilder::new(b"mntr", b"RGB ")
        .vcgt_table(&[0, 32768, 65535])
        .build();
    let profile = Profile::parse(&data).unwrap();

    let vcgt = profile.generate_vcgt(5).unwrap();
    assert_eq!(vcgt.len(), 5);
    assert_eq!(vcgt.entries()[0].red, 0);
    assert_eq!(vcgt.entries()[2].green, 32768);
    assert_eq!(vcgt.entries()[4].blue, 65535);
    assert!(profile.generate_vcgt(0).is_none());
    assert!(profile.generate_curve(16).is_none());
}

#[test]
fn test_scan_mixed_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("good.icc"), bluish()).unwrap();
    std::fs::write(dir.path().join("bad.icc"), b"not a profile").unwrap();

    let report = scan_profiles(&ProfileDecoder::new(), &[dir.path()]);
    assert_eq!(report.profiles.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].1, ParseError::Malformed { .. }));
}
