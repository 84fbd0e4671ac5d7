/*!
 * Caption track parsing and timeline reconstruction.
 *
 * - `timecode`: millisecond timestamps in VTT and SRT notation
 * - `vtt`: raw cue parsing
 * - `words`: per-word timeline from inline word markers
 * - `timeline`: settled caption recovery from rolling tracks
 */

pub mod timecode;
pub mod timeline;
pub mod vtt;
pub mod words;

pub use self::timeline::{is_text_match, resolve_overlaps, TimelineReconstructor};
pub use self::vtt::{parse_cues, Cue};
pub use self::words::{extract_words, Word};
