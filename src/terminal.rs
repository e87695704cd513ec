//! Terminal size probing for render width.

pub const DEFAULT_COLUMNS: u16 = 80;

/// Columns of the terminal attached to stdout, or [`DEFAULT_COLUMNS`] when stdout is not a
/// terminal.
pub fn terminal_columns() -> u16 {
    read_winsize(libc::STDOUT_FILENO)
        .map(|(columns, _)| columns)
        .unwrap_or(DEFAULT_COLUMNS)
}

/// Width handed to renderers: terminal columns minus `padding`, never below one column.
pub fn render_width(columns: u16, padding: usize) -> usize {
    usize::from(columns).saturating_sub(padding).max(1)
}

#[cfg(unix)]
fn read_winsize(fd: libc::c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn read_winsize(_fd: libc::c_int) -> Option<(u16, u16)> {
    None
}

#[cfg(test)]
mod tests {
    use super::render_width;

    #[test]
    fn render_width_subtracts_padding() {
        assert_eq!(render_width(80, 2), 78);
    }

    #[test]
    fn render_width_never_reaches_zero() {
        assert_eq!(render_width(1, 2), 1);
        assert_eq!(render_width(0, 0), 1);
    }
}
