//! Destination layout under the `Legal/` root.
//!
//! Files land in `<case folder>/<year>/<MM Month year>/` and are named
//! `<n>. <first five title words> (<DD-MM-YYYY>)<ext>`, numbered after the
//! highest number already present in the folder.

mod dates;
mod destination;
mod naming;
mod sequence;

pub use dates::{month_subfolder, parse_record_date, MONTH_NAMES};
pub use destination::{resolve_destination, Destination, LayoutError};
pub use naming::{
    attachment_extension, description_from_filename, format_filename, original_name,
    storage_key, strip_uuid_prefix, AttachmentName, DEFAULT_EXTENSION,
};
pub use sequence::{next_sequence_number, SequenceAllocator};
