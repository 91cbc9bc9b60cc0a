//! NIfTI-1 volume I/O.
//!
//! Reading goes through the `nifti` crate (gzip is detected from the magic
//! bytes, not the file name). Writing emits a single-file NIfTI-1 float32
//! image; paths ending in `.gz` are gzip-compressed.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use bone_enhancement::{Dims3, MaskVolume, Volume};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use ndarray::{Array, IxDyn};
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

const HEADER_LEN: usize = 348;
const VOX_OFFSET: usize = 352;
const DT_FLOAT32: i16 = 16;

/// Intensities on the grid of the file, plus the voxel-to-world transform.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiVolume {
    pub volume: Volume<f64>,
    /// Row-major 4x4 affine.
    pub affine: [f64; 16],
}

impl NiftiVolume {
    /// Wraps a volume with the axis-aligned affine implied by its spacing.
    pub fn from_volume(volume: Volume<f64>) -> Self {
        let [sx, sy, sz] = volume.spacing();
        #[rustfmt::skip]
        let affine = [
            sx, 0.0, 0.0, 0.0,
            0.0, sy, 0.0, 0.0,
            0.0, 0.0, sz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { volume, affine }
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

pub fn load(path: &Path) -> Result<NiftiVolume> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    decode(&bytes).with_context(|| format!("decoding NIfTI {}", path.display()))
}

/// Loads a label volume; intensities are rounded and clamped to `0..=255`.
pub fn load_mask(path: &Path) -> Result<MaskVolume> {
    let labels = load(path)?.volume;
    Ok(labels.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

pub fn decode(bytes: &[u8]) -> Result<NiftiVolume> {
    let obj = if is_gzip(bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes)))
            .context("reading gzipped NIfTI")?
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes)).context("reading NIfTI")?
    };

    let header = obj.header().clone();
    if header.dim[0] < 3 {
        bail!("expected a 3D volume, got {}D", header.dim[0]);
    }
    let affine = affine_from_header(&header);
    let spacing = [
        f64::from(header.pixdim[1].abs()),
        f64::from(header.pixdim[2].abs()),
        f64::from(header.pixdim[3].abs()),
    ];

    let array: Array<f64, IxDyn> = obj
        .into_volume()
        .into_ndarray()
        .context("converting NIfTI volume to ndarray")?;
    let shape = array.shape().to_vec();
    if shape.len() < 3 {
        bail!("expected a 3D array, got {}D", shape.len());
    }
    let dims = Dims3::new(shape[0], shape[1], shape[2]);

    // x fastest; for 4D inputs only the first volume is kept.
    let mut data = Vec::with_capacity(dims.len());
    let mut index = vec![0usize; shape.len()];
    for z in 0..dims.nz {
        for y in 0..dims.ny {
            for x in 0..dims.nx {
                index[0] = x;
                index[1] = y;
                index[2] = z;
                data.push(array[index.as_slice()]);
            }
        }
    }

    let mut volume = Volume::from_vec(dims, data).context("building volume from NIfTI data")?;
    if spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
        volume = volume.with_spacing(spacing)?;
    }

    Ok(NiftiVolume { volume, affine })
}

#[rustfmt::skip]
fn affine_from_header(header: &NiftiHeader) -> [f64; 16] {
    if header.sform_code > 0 {
        let (x, y, z) = (&header.srow_x, &header.srow_y, &header.srow_z);
        [
            f64::from(x[0]), f64::from(x[1]), f64::from(x[2]), f64::from(x[3]),
            f64::from(y[0]), f64::from(y[1]), f64::from(y[2]), f64::from(y[3]),
            f64::from(z[0]), f64::from(z[1]), f64::from(z[2]), f64::from(z[3]),
            0.0, 0.0, 0.0, 1.0,
        ]
    } else if header.qform_code > 0 {
        let p = &header.pixdim;
        qform_affine(
            [header.quatern_b, header.quatern_c, header.quatern_d].map(f64::from),
            [header.quatern_x, header.quatern_y, header.quatern_z].map(f64::from),
            [p[0], p[1], p[2], p[3]].map(f64::from),
        )
    } else {
        let p = &header.pixdim;
        [
            f64::from(p[1]), 0.0, 0.0, 0.0,
            0.0, f64::from(p[2]), 0.0, 0.0,
            0.0, 0.0, f64::from(p[3]), 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

/// Affine of a NIfTI-1 qform: rotation from the unit quaternion `(a, b, c, d)`
/// with `a` recovered from `b, c, d`, columns scaled by the voxel size and the
/// third column flipped when `qfac = pixdim[0]` is negative.
#[rustfmt::skip]
fn qform_affine(bcd: [f64; 3], offset: [f64; 3], pixdim: [f64; 4]) -> [f64; 16] {
    let [mut b, mut c, mut d] = bcd;
    let mut a = 1.0 - (b * b + c * c + d * d);
    if a < 1e-7 {
        // Nearly a 180 degree rotation: renormalize b, c, d and take a = 0.
        let n = (b * b + c * c + d * d).sqrt();
        if n > 0.0 {
            (b, c, d) = (b / n, c / n, d / n);
        }
        a = 0.0;
    } else {
        a = a.sqrt();
    }

    let qfac = if pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let (sx, sy, sz) = (pixdim[1], pixdim[2], qfac * pixdim[3]);
    let [ox, oy, oz] = offset;

    [
        (a * a + b * b - c * c - d * d) * sx, 2.0 * (b * c - a * d) * sy,         2.0 * (b * d + a * c) * sz,         ox,
        2.0 * (b * c + a * d) * sx,         (a * a + c * c - b * b - d * d) * sy, 2.0 * (c * d - a * b) * sz,         oy,
        2.0 * (b * d - a * c) * sx,         2.0 * (c * d + a * b) * sy,         (a * a + d * d - c * c - b * b) * sz, oz,
        0.0, 0.0, 0.0, 1.0,
    ]
}

/// Single-file NIfTI-1 float32 image of `volume` with the given affine.
pub fn encode(volume: &Volume<f64>, affine: &[f64; 16]) -> Result<Vec<u8>> {
    let dims = volume.dims();
    let mut dim = [3i16, 1, 1, 1, 1, 1, 1, 1];
    for (slot, n) in dim[1..4].iter_mut().zip([dims.nx, dims.ny, dims.nz]) {
        *slot = i16::try_from(n).with_context(|| format!("dimension {n} exceeds NIfTI-1 limit"))?;
    }
    let [sx, sy, sz] = volume.spacing();

    let mut header = [0u8; HEADER_LEN];
    put(&mut header, 0, &(HEADER_LEN as i32).to_le_bytes());
    for (i, d) in dim.iter().enumerate() {
        put(&mut header, 40 + 2 * i, &d.to_le_bytes());
    }
    put(&mut header, 70, &DT_FLOAT32.to_le_bytes());
    put(&mut header, 72, &32i16.to_le_bytes());
    let pixdim = [1.0f32, sx as f32, sy as f32, sz as f32, 1.0, 1.0, 1.0, 1.0];
    for (i, p) in pixdim.iter().enumerate() {
        put(&mut header, 76 + 4 * i, &p.to_le_bytes());
    }
    put(&mut header, 108, &(VOX_OFFSET as f32).to_le_bytes());
    put(&mut header, 112, &1.0f32.to_le_bytes());
    // sform_code: scanner anatomical
    put(&mut header, 254, &1i16.to_le_bytes());
    for row in 0..3 {
        for col in 0..4 {
            let v = affine[4 * row + col] as f32;
            put(&mut header, 280 + 16 * row + 4 * col, &v.to_le_bytes());
        }
    }
    put(&mut header, 344, b"n+1\0");

    let mut out = Vec::with_capacity(VOX_OFFSET + 4 * volume.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&[0u8; VOX_OFFSET - HEADER_LEN]);
    for &v in volume.data() {
        out.extend_from_slice(&(v as f32).to_le_bytes());
    }
    Ok(out)
}

fn put(header: &mut [u8; HEADER_LEN], offset: usize, bytes: &[u8]) {
    header[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Writes `volume` as float32 NIfTI; a `.gz` suffix selects gzip.
pub fn save(path: &Path, volume: &Volume<f64>, affine: &[f64; 16]) -> Result<()> {
    let mut bytes = encode(volume, affine)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes).context("compressing NIfTI")?;
        bytes = encoder.finish().context("finishing gzip stream")?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
