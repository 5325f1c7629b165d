//! Discrete Fourier transform of real sample buffers.

use std::f64::consts::PI;

use num::{
    Complex,
    Zero,
};

/// Forward DFT, `X[k] = sum_n x[n] exp(-2πi k n / N)`.
///
/// Uses an iterative radix-2 FFT if the length is a power of two and the
/// direct sum otherwise.
pub fn dft(samples: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer = samples
        .iter()
        .map(|x| Complex::new(*x, 0.0))
        .collect::<Vec<_>>();

    if buffer.len().is_power_of_two() {
        fft_in_place(&mut buffer);
        buffer
    }
    else {
        direct(&buffer)
    }
}

fn direct(input: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = input.len();
    (0..n)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .fold(Complex::zero(), |sum, (j, x)| {
                    // reduce the phase index first so large buffers keep precision
                    let phase = -2.0 * PI * ((k * j) % n) as f64 / n as f64;
                    sum + x * Complex::from_polar(1.0, phase)
                })
        })
        .collect()
}

fn fft_in_place(buffer: &mut [Complex<f64>]) {
    let n = buffer.len();
    if n <= 1 {
        return;
    }

    // bit reversal permutation
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            buffer.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let twiddle = Complex::from_polar(1.0, -2.0 * PI / len as f64);
        for chunk in buffer.chunks_exact_mut(len) {
            let (lower, upper) = chunk.split_at_mut(len / 2);
            let mut w = Complex::new(1.0, 0.0);
            for (a, b) in lower.iter_mut().zip(upper.iter_mut()) {
                let t = w * *b;
                *b = *a - t;
                *a += t;
                w *= twiddle;
            }
        }
        len <<= 1;
    }
}
