//! Safetensors / JSON boundary.
//!
//! Reader: a record file with one F32 tensor per record, keyed
//!
//! ```text
//! signal/<id>        [T, C]     required for every signal record
//! mask/<id>          [T, C]     optional, defaults to all-ones
//! spectrogram/<id>   [G, F, W]
//! ```
//!
//! Writer: [`write_batch`] dumps a collated [`Batch`].
use anyhow::{bail, Context, Result};
use ndarray::{Array2, Array3, ArrayBase, Data, Dimension};
use std::collections::HashMap;
use std::path::Path;

use crate::labels::LabelRow;
use crate::loader::Batch;
use crate::records::{RecordCache, SignalRecord};

// ── Low-level safetensors parser ─────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(serde_json::Map<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let n = usize::try_from(u64::from_le_bytes(bytes[..8].try_into()?))
        .context("safetensors header length does not fit in memory")?;
    let data_start = match 8usize.checked_add(n) {
        Some(end) if end <= bytes.len() => end,
        _ => bail!("safetensors header truncated ({} bytes, header claims {n})", bytes.len()),
    };
    let header: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..data_start])
            .context("failed to parse safetensors header")?;
    Ok((header, data_start))
}

struct TensorEntry {
    shape: Vec<usize>,
    data: Vec<f32>,
}

fn read_f32_entry(bytes: &[u8], data_start: usize, name: &str, entry: &serde_json::Value) -> Result<TensorEntry> {
    let dtype = entry["dtype"].as_str().context("missing dtype")?;
    if dtype != "F32" {
        bail!("tensor {name}: expected F32, got {dtype}");
    }
    let offsets = entry["data_offsets"]
        .as_array()
        .with_context(|| format!("tensor {name}: missing data_offsets"))?;
    let s = offsets.first().and_then(|v| v.as_u64()).context("bad data_offsets")? as usize;
    let e = offsets.get(1).and_then(|v| v.as_u64()).context("bad data_offsets")? as usize;
    let raw = data_start
        .checked_add(s)
        .zip(data_start.checked_add(e))
        .and_then(|(s, e)| bytes.get(s..e))
        .with_context(|| format!("tensor {name}: data out of range"))?;
    let data: Vec<f32> = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let shape = entry["shape"]
        .as_array()
        .with_context(|| format!("tensor {name}: missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("bad shape"))
        .collect::<Result<Vec<_>>>()?;
    Ok(TensorEntry { shape, data })
}

fn into_arr2(name: &str, t: TensorEntry) -> Result<Array2<f32>> {
    if t.shape.len() != 2 {
        bail!("tensor {name}: expected 2-d, got shape {:?}", t.shape);
    }
    Ok(Array2::from_shape_vec((t.shape[0], t.shape[1]), t.data)?)
}

fn into_arr3(name: &str, t: TensorEntry) -> Result<Array3<f32>> {
    if t.shape.len() != 3 {
        bail!("tensor {name}: expected 3-d, got shape {:?}", t.shape);
    }
    Ok(Array3::from_shape_vec((t.shape[0], t.shape[1], t.shape[2]), t.data)?)
}

fn parse_key(key: &str) -> Result<(&str, i64)> {
    let (kind, id) = key
        .split_once('/')
        .with_context(|| format!("unexpected tensor key {key:?}"))?;
    let id = id.parse().with_context(|| format!("bad record id in {key:?}"))?;
    Ok((kind, id))
}

// ── Readers ──────────────────────────────────────────────────────────────────

/// Load a record cache from a safetensors file (see module docs for keys).
pub fn load_records(path: &Path) -> Result<RecordCache> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let mut signals: HashMap<i64, Array2<f32>> = HashMap::new();
    let mut masks: HashMap<i64, Array2<f32>> = HashMap::new();
    let mut cache = RecordCache::new();

    for (key, entry) in &header {
        if key == "__metadata__" {
            continue;
        }
        let (kind, id) = parse_key(key)?;
        let tensor = read_f32_entry(&bytes, data_start, key, entry)?;
        match kind {
            "signal" => {
                signals.insert(id, into_arr2(key, tensor)?);
            }
            "mask" => {
                masks.insert(id, into_arr2(key, tensor)?);
            }
            "spectrogram" => cache.insert_spectrogram(id, into_arr3(key, tensor)?),
            other => bail!("unknown record kind {other:?} in key {key:?}"),
        }
    }

    if let Some(id) = masks.keys().find(|id| !signals.contains_key(id)) {
        bail!("mask/{id} has no matching signal/{id}");
    }
    for (id, signal) in signals {
        let record = match masks.remove(&id) {
            Some(mask) => SignalRecord::new(signal, mask)
                .with_context(|| format!("record {id}"))?,
            None => SignalRecord::unmasked(signal),
        };
        cache.insert_signal(id, record);
    }

    tracing::info!(
        signals = cache.num_signals(),
        spectrograms = cache.num_spectrograms(),
        path = %path.display(),
        "records loaded"
    );
    Ok(cache)
}

/// Load label rows from a JSON array of [`LabelRow`] objects.
pub fn load_label_rows(path: &Path) -> Result<Vec<LabelRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Minimal safetensors writer for F32 and I64 tensors.
///
/// ```rust,no_run
/// use eegwin::io::StWriter;
/// use ndarray::Array2;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32_arr("signal/1", &Array2::<f32>::zeros((2000, 20)));
/// w.write(Path::new("/tmp/records.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32_arr<S, D>(&mut self, name: &str, arr: &ArrayBase<S, D>)
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let bytes: Vec<u8> = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", arr.shape().to_vec()));
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I64", shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Batch writer ──────────────────────────────────────────────────────────────

/// Write a collated batch.
///
/// Keys: `record_id` [B] I64, `signal` / `mask` [B, T, C], and when present
/// `spectrogram` [B, G, F, W], `label` [B, classes], `weight` [B, 1].
pub fn write_batch(batch: &Batch, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    w.add_i64("record_id", &batch.record_ids, &[batch.len()]);
    w.add_f32_arr("signal", &batch.signal);
    w.add_f32_arr("mask", &batch.mask);
    if let Some(spec) = &batch.spectrogram {
        w.add_f32_arr("spectrogram", spec);
    }
    if let Some(label) = &batch.label {
        w.add_f32_arr("label", label);
    }
    if let Some(weight) = &batch.weight {
        w.add_f32_arr("weight", weight);
    }
    w.write(path)
}
