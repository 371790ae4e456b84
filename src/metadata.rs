//! Capture dates from embedded EXIF metadata.

use std::io::Cursor;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

/// MIME types whose content is parsed for a capture date.
pub const CAPTURE_DATE_MIME_TYPES: &[&str] = &["image/jpeg", "image/tiff"];

/// The metadata container could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct MetadataError {
    pub reason: String,
}

/// Reads a capture timestamp out of a file's bytes.
///
/// `Ok(None)` means the file has no usable capture date; `Err` means the
/// container itself is malformed.
pub trait CaptureDateReader: Send + Sync {
    fn capture_date(&self, bytes: &[u8]) -> Result<Option<DateTime<Utc>>, MetadataError>;
}

/// `CaptureDateReader` backed by kamadak-exif, reading DateTimeOriginal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifReader;

impl CaptureDateReader for ExifReader {
    fn capture_date(&self, bytes: &[u8]) -> Result<Option<DateTime<Utc>>, MetadataError> {
        let mut cursor = Cursor::new(bytes);
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => {
                return Err(MetadataError {
                    reason: e.to_string(),
                });
            }
        };

        let Some(raw) = first_ascii(&exif, exif::Tag::DateTimeOriginal) else {
            return Ok(None);
        };

        // Cameras without a clock write blanks or zeros here.
        let mut datetime = match exif::DateTime::from_ascii(raw) {
            Ok(datetime) => datetime,
            Err(e) => {
                debug!(value = %String::from_utf8_lossy(raw), error = %e, "unusable DateTimeOriginal");
                return Ok(None);
            }
        };

        if let Some(offset) = first_ascii(&exif, exif::Tag::OffsetTimeOriginal)
            && let Err(e) = datetime.parse_offset(offset)
        {
            debug!(value = %String::from_utf8_lossy(offset), error = %e, "unusable OffsetTimeOriginal");
        }

        Ok(exif_to_utc(&datetime))
    }
}

/// First string of an ASCII field in the primary image.
fn first_ascii(exif: &exif::Exif, tag: exif::Tag) -> Option<&[u8]> {
    match exif.get_field(tag, exif::In::PRIMARY)?.value {
        exif::Value::Ascii(ref values) => values.first().map(Vec::as_slice),
        _ => None,
    }
}

/// Converts an EXIF date/time to UTC.
///
/// Without an explicit offset the value is wall-clock time in the local zone.
fn exif_to_utc(datetime: &exif::DateTime) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(
        i32::from(datetime.year),
        u32::from(datetime.month),
        u32::from(datetime.day),
    )?
    .and_hms_opt(
        u32::from(datetime.hour),
        u32::from(datetime.minute),
        u32::from(datetime.second),
    )?;

    match datetime.offset {
        Some(minutes) => FixedOffset::east_opt(i32::from(minutes) * 60)?
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Builds a minimal big-endian TIFF whose Exif IFD holds DateTimeOriginal
/// and, when given, OffsetTimeOriginal.
///
/// `value` must be the 19-character `YYYY:MM:DD HH:MM:SS` form.
#[cfg(test)]
pub(crate) fn tiff_with_capture_date(value: &str, offset: Option<&str>) -> Vec<u8> {
    assert_eq!(value.len(), 19);

    let mut fields = vec![(0x9003u16, format!("{value}\0"))];
    if let Some(offset) = offset {
        fields.push((0x9011, format!("{offset}\0")));
    }

    let exif_ifd = 26u32;
    let data_start = exif_ifd + 2 + 12 * fields.len() as u32 + 4;

    let mut tiff = Vec::new();
    // Header, IFD0 at offset 8
    tiff.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08");
    // IFD0: one entry, ExifIFDPointer
    tiff.extend_from_slice(&[0x00, 0x01]);
    tiff.extend_from_slice(&[0x87, 0x69, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01]);
    tiff.extend_from_slice(&exif_ifd.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());
    // Exif IFD: ASCII entries, values stored after the IFD
    tiff.extend_from_slice(&(fields.len() as u16).to_be_bytes());
    let mut data = Vec::new();
    for (tag, text) in &fields {
        tiff.extend_from_slice(&tag.to_be_bytes());
        tiff.extend_from_slice(&2u16.to_be_bytes());
        tiff.extend_from_slice(&(text.len() as u32).to_be_bytes());
        tiff.extend_from_slice(&(data_start + data.len() as u32).to_be_bytes());
        data.extend_from_slice(text.as_bytes());
    }
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&data);
    tiff
}

/// Wraps [`tiff_with_capture_date`] in a JPEG APP1 segment.
#[cfg(test)]
pub(crate) fn jpeg_with_capture_date_and_offset(value: &str, offset: Option<&str>) -> Vec<u8> {
    let tiff = tiff_with_capture_date(value, offset);

    let mut jpeg = vec![0xff, 0xd8, 0xff, 0xe1];
    let length = (2 + 6 + tiff.len()) as u16;
    jpeg.extend_from_slice(&length.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\x00\x00");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xff, 0xd9]);
    jpeg
}

#[cfg(test)]
pub(crate) fn jpeg_with_capture_date(value: &str) -> Vec<u8> {
    jpeg_with_capture_date_and_offset(value, None)
}
