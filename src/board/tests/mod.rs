//! Cross-cutting board test suites.

mod draw;
mod legality;
mod make_unmake;
