// src/fasta.rs

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::amplicons::Amplicons;
use crate::diagnostics::Diagnostics;
use crate::error::{AmpliconError, Result};

/// Residues per FASTA sequence line.
pub const FASTA_LINE_WIDTH: usize = 80;

/// Open a text input, transparently decompressing `.gz` files.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| AmpliconError::io(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

/// Write every amplicon as a FASTA record, in map order, wrapping at
/// [`FASTA_LINE_WIDTH`].
pub fn write_fasta<W: Write>(amplicons: &Amplicons, out: &mut W) -> std::io::Result<()> {
    for (seq_id, amplicon) in amplicons {
        writeln!(out, ">{seq_id}")?;
        for chunk in amplicon.seq.as_bytes().chunks(FASTA_LINE_WIDTH) {
            out.write_all(chunk)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Write the query FASTA unless `path` already exists.
///
/// Returns `true` when the file was written.
pub fn write_fasta_if_needed<P: AsRef<Path>>(
    amplicons: &Amplicons,
    path: P,
    diag: &dyn Diagnostics,
) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        diag.info(&format!("{} already exists, skipping FASTA writing.", path.display()));
        return Ok(false);
    }

    diag.info(&format!("Writing multi-FASTA to {}", path.display()));
    let file = File::create(path).map_err(|e| AmpliconError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_fasta(amplicons, &mut out)
        .and_then(|_| out.flush())
        .map_err(|e| AmpliconError::io(path, e))?;
    diag.info(&format!("Wrote {} FASTA records.", amplicons.len()));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplicons::AmpliconRecord;
    use crate::diagnostics::MemoryDiagnostics;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Read;

    fn amplicon(id: &str, seq: &str) -> (String, AmpliconRecord) {
        (
            id.to_string(),
            AmpliconRecord { sequence_id: id.to_string(), seq: seq.to_string() },
        )
    }

    #[test]
    fn wraps_long_sequences_at_80() {
        let seq = "A".repeat(170);
        let amplicons: Amplicons = [amplicon("s1", &seq), amplicon("s2", "ACGT")].into_iter().collect();

        let mut buf = Vec::new();
        write_fasta(&amplicons, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], ">s1");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(lines[4], ">s2");
        assert_eq!(lines[5], "ACGT");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn existing_fasta_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.fasta");
        std::fs::write(&path, "stale").unwrap();

        let amplicons: Amplicons = [amplicon("s1", "ACGT")].into_iter().collect();
        let diag = MemoryDiagnostics::new();
        assert!(!write_fasta_if_needed(&amplicons, &path, &diag).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "stale");
    }

    #[test]
    fn reads_gzip_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tax.txt.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"id1 Bacteria;Firmicutes\n").unwrap();
        enc.finish().unwrap();

        let mut text = String::new();
        open_input(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "id1 Bacteria;Firmicutes\n");
    }

    #[test]
    fn missing_input_is_io_error() {
        let err = open_input("/definitely/not/here.txt").err().unwrap();
        assert!(matches!(err, AmpliconError::Io { .. }));
    }
}
