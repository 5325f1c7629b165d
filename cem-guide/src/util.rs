pub fn format_size<T>(value: T) -> humansize::SizeFormatter<T, humansize::FormatSizeOptions>
where
    T: humansize::ToF64 + humansize::Unsigned,
{
    humansize::SizeFormatter::new(value, humansize::BINARY)
}

/// Index of the lattice cell containing `coordinate`, clamped to the lattice.
pub fn nearest_cell(coordinate: f64, origin: f64, cell_size: f64, cells: usize) -> usize {
    let index = ((coordinate - origin) / cell_size).floor();
    if index <= 0.0 {
        0
    }
    else {
        (index as usize).min(cells.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use crate::util::nearest_cell;

    #[test]
    fn nearest_cell_is_clamped() {
        assert_eq!(nearest_cell(-1.5, -1.5, 0.1, 30), 0);
        assert_eq!(nearest_cell(-1.44, -1.5, 0.1, 30), 0);
        assert_eq!(nearest_cell(0.01, -1.5, 0.1, 30), 15);
        assert_eq!(nearest_cell(1.5, -1.5, 0.1, 30), 29);
        assert_eq!(nearest_cell(-3.0, -1.5, 0.1, 30), 0);
    }
}
