use rectpack::{
    BoundingBoxFinder, CancelToken, GuillotinePlacement, Item, PowerOfTwoSizePacker,
    ReportProgress,
};

fn main() {
    env_logger::init();

    let inputs: Vec<_> = (0..5).map(|id| Item::new((128, 128), id)).collect();

    let mut packer = PowerOfTwoSizePacker::new(GuillotinePlacement::new());
    packer
        .progress_mut()
        .subscribe(|percent| log::info!("{}% done", percent));

    let result = packer.find_minimum_bounding_box(&inputs, &CancelToken::new());

    println!("Pack result: {:#?}", result);
}
