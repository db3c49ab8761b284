//! Image container classification and header-only dimension reads.
//!
//! Payloads are classified from fixed magic prefixes and measured without
//! decoding any pixel data: PNG keeps its dimensions at fixed offsets inside
//! the mandatory IHDR chunk, JPEG inside the first start-of-frame segment,
//! and WEBP inside whichever of its three sub-chunk flavors is present.
//! Truncated or malformed input yields `None`, never an error.

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const VP8_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];
const VP8L_SIGNATURE: u8 = 0x2F;

/// Image container kind, derived from magic prefixes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Png,
    Jpeg,
    Webp,
    Unknown,
}

/// Intrinsic description of an image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub kind: ContainerKind,
    pub width: u32,
    pub height: u32,
}

/// Classify a payload from its magic prefix. Reads at most 12 bytes.
pub fn classify(bytes: &[u8]) -> ContainerKind {
    if bytes.starts_with(&PNG_SIGNATURE) {
        return ContainerKind::Png;
    }
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xD8 {
        return ContainerKind::Jpeg;
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return ContainerKind::Webp;
    }
    ContainerKind::Unknown
}

/// Extract intrinsic width and height without decoding.
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    match classify(bytes) {
        ContainerKind::Png => png_dimensions(bytes),
        ContainerKind::Jpeg => jpeg_dimensions(bytes),
        ContainerKind::Webp => webp_dimensions(bytes),
        ContainerKind::Unknown => None,
    }
}

/// Classify and measure in one step.
pub fn probe(bytes: &[u8]) -> Option<ImageInfo> {
    let kind = classify(bytes);
    let (width, height) = dimensions(bytes)?;
    Some(ImageInfo {
        kind,
        width,
        height,
    })
}

/// PNG: big-endian 32-bit width/height at offsets 16 and 20, immediately
/// after the signature and the IHDR chunk header.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 {
        return None;
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    Some((width, height))
}

/// JPEG: walk marker segments until a start-of-frame marker carries the
/// big-endian height/width pair.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut off = 2usize;
    while off + 3 < data.len() {
        if data[off] != 0xFF {
            // Stray byte between segments.
            off += 1;
            continue;
        }
        let marker = data[off + 1];
        // Stand-alone markers carry no length field.
        if marker == 0xD8 || marker == 0xD9 {
            off += 2;
            continue;
        }
        if off + 4 > data.len() {
            break;
        }
        let seg_len = usize::from(u16::from_be_bytes([data[off + 2], data[off + 3]]));
        if seg_len < 2 || off + 2 + seg_len > data.len() {
            break;
        }
        if matches!(marker, 0xC0 | 0xC1 | 0xC2) {
            // SOF0/1/2: [precision][height][width].
            if seg_len < 7 {
                return None;
            }
            let height = u16::from_be_bytes([data[off + 5], data[off + 6]]);
            let width = u16::from_be_bytes([data[off + 7], data[off + 8]]);
            return Some((u32::from(width), u32::from(height)));
        }
        off += 2 + seg_len;
    }
    None
}

/// WEBP: iterate sub-chunks after the 12-byte RIFF header and decode the
/// first dimension-bearing one (VP8X, lossy VP8, or lossless VP8L).
fn webp_dimensions(buf: &[u8]) -> Option<(u32, u32)> {
    let mut off = 12usize;
    while off + 8 <= buf.len() {
        let fourcc = &buf[off..off + 4];
        let size =
            u32::from_le_bytes([buf[off + 4], buf[off + 5], buf[off + 6], buf[off + 7]]) as usize;
        let start = off + 8;
        match fourcc {
            b"VP8X" => {
                if start + 10 > buf.len() {
                    return None;
                }
                let width = le24(&buf[start + 4..start + 7]);
                let height = le24(&buf[start + 7..start + 10]);
                return Some((width + 1, height + 1));
            }
            b"VP8 " if size >= 10 => {
                let sig = start + 3;
                if sig + 7 <= buf.len() && buf[sig..sig + 3] == VP8_START_CODE {
                    let width = u16::from_le_bytes([buf[sig + 3], buf[sig + 4]]) & 0x3FFF;
                    let height = u16::from_le_bytes([buf[sig + 5], buf[sig + 6]]) & 0x3FFF;
                    return Some((u32::from(width), u32::from(height)));
                }
            }
            b"VP8L" if size >= 5 => {
                if start + 5 <= buf.len() && buf[start] == VP8L_SIGNATURE {
                    let b1 = u32::from(buf[start + 1]);
                    let b2 = u32::from(buf[start + 2]);
                    let b3 = u32::from(buf[start + 3]);
                    let b4 = u32::from(buf[start + 4]);
                    // Two 14-bit minus-one fields packed across four bytes.
                    let width = (b1 | ((b2 & 0x3F) << 8)) + 1;
                    let height = ((b2 >> 6) | (b3 << 2) | ((b4 & 0x03) << 10)) + 1;
                    return Some((width, height));
                }
            }
            _ => {}
        }
        // Chunks are padded to even length.
        off = start + ((size + 1) & !1);
    }
    None
}

fn le24(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | (u32::from(bytes[1]) << 8) | (u32::from(bytes[2]) << 16)
}
