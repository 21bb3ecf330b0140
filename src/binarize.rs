//! Бинаризация одной линии (строки или столбца) и разбиение на run'ы.
//!
//! Линейный детектор работает с уже «одномерными» данными: яркости вдоль
//! линии → чёрное/белое → длины отрезков одного цвета. Два способа:
//! - адаптивный по скользящему среднему, устойчив к неравномерной засветке;
//! - глобальный порог как фоллбэк.

/// Глобальный порог линии: середина между средним и серединой диапазона min/max.
#[inline]
pub fn otsu_like_threshold(line: &[u8]) -> u8 {
    if line.is_empty() {
        return 128;
    }
    let (mut min_v, mut max_v) = (u8::MAX, 0u8);
    let mut sum: u64 = 0;
    for &v in line {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        sum += u64::from(v);
    }
    let mean = sum / line.len() as u64;
    let mid = (u64::from(min_v) + u64::from(max_v)) / 2;
    ((mean + mid) / 2) as u8
}

/// Глобальная бинаризация: true = чёрный.
pub fn binarize_line(line: &[u8]) -> Vec<bool> {
    let t = otsu_like_threshold(line);
    line.iter().map(|&v| v < t).collect()
}

/// Адаптивная бинаризация по среднему в окне ±`win` с небольшим смещением к белому.
/// Окно: длина/32 в пределах [8..64].
pub fn binarize_line_adaptive(line: &[u8]) -> Vec<bool> {
    let n = line.len();
    if n == 0 {
        return Vec::new();
    }
    let win = (n / 32).clamp(8, 64);
    let bias: u32 = 5;

    // префиксные суммы для среднего по окну
    let mut pref: Vec<u32> = Vec::with_capacity(n + 1);
    let mut acc = 0u32;
    pref.push(0);
    for &v in line {
        acc += u32::from(v);
        pref.push(acc);
    }

    (0..n)
        .map(|i| {
            let left = i.saturating_sub(win);
            let right = (i + win).min(n - 1);
            let len = (right - left + 1) as u32;
            let mean = (pref[right + 1] - pref[left]) / len;
            u32::from(line[i]) + bias < mean
        })
        .collect()
}

/// Линия в виде run-length: длины отрезков и цвет первого из них.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Runs {
    pub lengths: Vec<usize>,
    pub first_black: bool,
}

impl Runs {
    /// Разбить бинарную линию на run'ы.
    pub fn from_binary(bin: &[bool]) -> Self {
        let Some(&first) = bin.first() else {
            return Self {
                lengths: Vec::new(),
                first_black: false,
            };
        };
        let mut lengths = Vec::new();
        let mut cur = first;
        let mut len = 0usize;
        for &b in bin {
            if b == cur {
                len += 1;
            } else {
                lengths.push(len);
                cur = b;
                len = 1;
            }
        }
        lengths.push(len);
        Self {
            lengths,
            first_black: first,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Run `k` — бар (чёрный)?
    #[inline]
    pub fn is_bar(&self, k: usize) -> bool {
        self.first_black == (k % 2 == 0)
    }

    /// Та же линия, прочитанная справа налево.
    pub fn reversed(&self) -> Self {
        let n = self.lengths.len();
        let mut lengths = self.lengths.clone();
        lengths.reverse();
        let first_black = n > 0 && self.is_bar(n - 1);
        Self {
            lengths,
            first_black,
        }
    }
}
