use criterion::{black_box, criterion_group, criterion_main, Criterion};
use linear_pipeline::{
    BlendMode, Color, ColorType, EmbeddableLinearPipeline, FilterQuality, ImageInfo,
    LinearBitmapPipeline, Matrix, Pixmap, Pm4f, TileMode,
};

const SIZE: i32 = 64;
const SPAN: usize = 256;

fn source() -> Vec<u8> {
    (0..SIZE * SIZE * 4).map(|i| (i * 7 % 251) as u8).collect()
}

fn bench_shade(c: &mut Criterion) {
    let pixels = source();
    let info = ImageInfo::new_premul(SIZE, SIZE, ColorType::Rgba8888);
    let src = Pixmap::new_packed(info, &pixels).unwrap();
    let mut out = vec![Pm4f::default(); SPAN];

    let cases = [
        ("translate_nearest_repeat", Matrix::new_translation(3.0, 5.0), FilterQuality::None),
        ("scale_bilerp_repeat", Matrix::new_scale_translate(0.37, 0.37, 1.0, 2.0), FilterQuality::Low),
        ("affine_bilerp_repeat", Matrix::new_affine(0.8, 0.3, -0.3, 0.8, 4.0, 1.0), FilterQuality::Low),
    ];
    for (name, inverse, filter) in cases {
        let p = LinearBitmapPipeline::new(
            &inverse,
            filter,
            TileMode::Repeat,
            TileMode::Repeat,
            Color::BLACK,
            &src,
        );
        c.bench_function(name, |b| {
            b.iter(|| p.shade_span_4f(black_box(0), black_box(7), &mut out, SPAN))
        });
    }
}

fn bench_blit(c: &mut Criterion) {
    let pixels = source();
    let info = ImageInfo::new_premul(SIZE, SIZE, ColorType::Rgba8888);
    let src = Pixmap::new_packed(info, &pixels).unwrap();
    let shader = LinearBitmapPipeline::new(
        &Matrix::new_translation(2.0, 0.0),
        FilterQuality::None,
        TileMode::Repeat,
        TileMode::Repeat,
        Color::BLACK,
        &src,
    );
    let key = shader.sampling_key();
    let dst_info = ImageInfo::new_premul(SPAN as i32, 1, ColorType::Rgba8888);

    for (name, mode) in [("blit_unit_copy", BlendMode::Src), ("blit_src_over", BlendMode::SrcOver)] {
        let mut storage = EmbeddableLinearPipeline::new();
        LinearBitmapPipeline::clone_pipeline_for_blitting(
            &mut storage,
            &shader,
            key.matrix_mask,
            key.x_tile,
            key.y_tile,
            key.filter_quality,
            &src,
            1.0,
            mode,
            &dst_info,
        )
        .unwrap();
        let mut dst = vec![0u8; SPAN * 4];
        c.bench_function(name, |b| {
            b.iter(|| storage.blit_span(black_box(0), black_box(3), &mut dst, SPAN))
        });
    }
}

criterion_group!(benches, bench_shade, bench_blit);
criterion_main!(benches);
