use log::{error, info};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read back the default framebuffer and write it to
/// `<name>_<unix-time>.png` on a detached worker thread.
///
/// Fire-and-forget: nothing tracks the encode, there is no cancellation,
/// and failures only surface in the log. A failure to launch the worker is
/// logged synchronously.
pub fn save_framebuffer(name: &str, width: u32, height: u32) {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    unsafe {
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
        gl::ReadPixels(
            0,
            0,
            width as i32,
            height as i32,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            pixels.as_mut_ptr() as *mut _,
        );
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = format!("{name}_{stamp}.png");

    let spawned = thread::Builder::new()
        .name("snapshot-encoder".into())
        .spawn(move || {
            flip_rows(&mut pixels, width as usize, height as usize);
            match image::save_buffer(
                &path,
                &pixels,
                width,
                height,
                image::ExtendedColorType::Rgba8,
            ) {
                Ok(()) => info!("wrote {path}"),
                Err(err) => error!("error writing {path}: {err}"),
            }
        });
    if let Err(err) = spawned {
        error!("could not start snapshot encoder: {err}");
    }
}

/// GL reads bottom-up; image files want top-down.
fn flip_rows(pixels: &mut [u8], width: usize, height: usize) {
    let row_len = width * 4;
    let (mut top, mut bottom) = (0, height.saturating_sub(1));
    while top < bottom {
        let (head, tail) = pixels.split_at_mut(bottom * row_len);
        head[top * row_len..top * row_len + row_len]
            .swap_with_slice(&mut tail[..row_len]);
        top += 1;
        bottom -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_swaps_rows_in_place() {
        // 1x3 RGBA image: rows a, b, c
        let mut pixels: Vec<u8> = vec![
            1, 1, 1, 1, //
            2, 2, 2, 2, //
            3, 3, 3, 3, //
        ];
        flip_rows(&mut pixels, 1, 3);
        assert_eq!(
            pixels,
            vec![
                3, 3, 3, 3, //
                2, 2, 2, 2, //
                1, 1, 1, 1, //
            ]
        );
    }

    #[test]
    fn flip_handles_degenerate_heights() {
        let mut one_row = vec![9u8; 8];
        let expected = one_row.clone();
        flip_rows(&mut one_row, 2, 1);
        assert_eq!(one_row, expected);

        let mut empty: Vec<u8> = Vec::new();
        flip_rows(&mut empty, 0, 0);
        assert!(empty.is_empty());
    }
}
