//! Upload payloads for end-to-end tests
//!
//! Only the leading magic bytes matter to the server's content sniffing,
//! so the payloads are tiny synthetic files.

/// A minimal JFIF header followed by padding.
pub fn jpeg_frame() -> Vec<u8> {
    let mut bytes = vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00,
    ];
    bytes.resize(256, 0);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

/// A RIFF/WAVE clip of `len` bytes (header included).
pub fn wav_clip(len: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(len.max(44));
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&((len.max(44) - 8) as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&16_000u32.to_le_bytes());
    bytes.extend_from_slice(&32_000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&((len.max(44) - 44) as u32).to_le_bytes());
    bytes.resize(len.max(44), 0);
    bytes
}

pub fn pdf_document() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec()
}

pub fn plain_text() -> Vec<u8> {
    b"definitely not a picture".to_vec()
}
