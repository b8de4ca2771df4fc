/// Mix interleaved stereo samples down to mono
///
/// Each `[L, R]` pair becomes `floor((L + R) / 2)`. An unpaired trailing
/// sample is ignored, so the output is always `samples.len() / 2` long.
pub fn stereo_to_mono(samples: &[i16]) -> Vec<i16> {
    let mut mono = Vec::with_capacity(samples.len() / 2);
    for pair in samples.chunks_exact(2) {
        let sum = pair[0] as i32 + pair[1] as i32;
        mono.push(sum.div_euclid(2) as i16);
    }
    mono
}
