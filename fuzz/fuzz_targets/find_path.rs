#![no_main]

use libfuzzer_sys::fuzz_target;

use gridpath::pathfinder::find_path;

// Layout: width, start x, start y, goal x, goal y, then one flag per cell.
fuzz_target!(|data: &[u8]| {
    let [width, sx, sy, gx, gy, flags @ ..] = data else {
        return;
    };
    let width = (*width as usize).max(1);
    let rows: Vec<Vec<u8>> = flags.chunks(width).map(|row| row.to_vec()).collect();

    let start = (*sx as i64, *sy as i64);
    let goal = (*gx as i64, *gy as i64);
    let Ok(path) = find_path(&rows, start, goal) else {
        return;
    };

    if let (Some(first), Some(last)) = (path.first(), path.last()) {
        assert_eq!((first.x() as i64, first.y() as i64), start);
        assert_eq!((last.x() as i64, last.y() as i64), goal);
    }
    for pair in path.windows(2) {
        assert!(pair[0].is_adjacent(&pair[1]));
    }
    for cell in &path {
        assert_eq!(rows[cell.y() as usize][cell.x() as usize], 0);
    }
});
