use be_core::{Axis, BorderMode, Volume, resolve_index};
use rayon::prelude::*;

/// Convolves `src` with a centered kernel of length `2*radius+1` along one
/// axis. Output slices (constant z) are computed in parallel.
pub fn convolve_axis(
    src: &Volume<f64>,
    kernel: &[f64],
    radius: usize,
    axis: Axis,
    border: BorderMode,
) -> Volume<f64> {
    assert_eq!(
        kernel.len(),
        2 * radius + 1,
        "kernel len must be 2*radius+1"
    );

    let dims = src.dims();
    let mut out = Volume::new_fill(dims, 0.0f64);
    if dims.is_empty() {
        return out;
    }

    let data = src.data();
    let slice_len = dims.nx * dims.ny;
    let axis_len = dims.axis_len(axis);
    let stride = dims.axis_stride(axis) as isize;

    out.data_mut()
        .par_chunks_mut(slice_len)
        .enumerate()
        .for_each(|(z, out_slice)| {
            for y in 0..dims.ny {
                for x in 0..dims.nx {
                    let pos = [x, y, z][axis.as_index()] as isize;
                    let center = dims.index(x, y, z) as isize;
                    let mut acc = 0.0f64;
                    for (k, &kv) in kernel.iter().enumerate() {
                        let i = pos + radius as isize - k as isize;
                        let v = match resolve_index(i, axis_len, border) {
                            Some(j) => data[(center + (j as isize - pos) * stride) as usize],
                            None => match border {
                                BorderMode::Constant(c) => c,
                                _ => 0.0,
                            },
                        };
                        acc += v * kv;
                    }
                    out_slice[x + dims.nx * y] = acc;
                }
            }
        });

    // Grid and spacing follow the source.
    src.with_data(out.into_data())
        .expect("output buffer matches source grid")
}
