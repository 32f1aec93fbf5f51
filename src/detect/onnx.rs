//! YOLOv8-segmentation detector backed by ONNX Runtime.
//!
//! The model contract is the standard ultralytics segmentation export:
//! input `[1, 3, H, W]` normalized to `[0, 1]`, outputs `output0`
//! `[1, 4 + classes + coeffs, anchors]` and `output1`
//! `[1, coeffs, mh, mw]` (mask prototypes). A detection-only export
//! (no `output1`) still works; its instances come back ring-less and
//! the pipeline drops them.

use crate::constants::detector::{MASK_THRESHOLD, MAX_MODEL_ANCHORS, NMS_IOU_THRESHOLD};
use crate::detect::{Detector, PixelBox, RawDetection};
use crate::error::{Error, Result};
use crate::raster::Tile;
use ndarray::{Array2, Array4};
use ort::session::Session;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Detector running a YOLOv8-seg ONNX model.
pub struct OnnxDetector {
    // Inference is serialized; the pipeline is single-threaded anyway.
    session: Mutex<Session>,
    input_width: usize,
    input_height: usize,
    min_confidence: f32,
}

/// One decoded candidate before mask composition.
struct Candidate {
    bbox: PixelBox,
    confidence: f32,
    coeffs: Vec<f32>,
}

impl OnnxDetector {
    /// Load a model from disk and validate its input shape.
    pub fn new(model_path: &Path, min_confidence: f32) -> Result<Self> {
        let session = Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| Error::DetectorBuild {
                reason: format!("{}: {e}", model_path.display()),
            })?;

        let input = session.inputs().first().ok_or_else(|| Error::DetectorBuild {
            reason: "model has no inputs".to_string(),
        })?;
        let dims: Vec<i64> = input
            .dtype()
            .tensor_shape()
            .ok_or_else(|| Error::DetectorBuild {
                reason: "model input is not a tensor".to_string(),
            })?
            .to_vec();
        if dims.len() != 4 || dims[1] != 3 {
            return Err(Error::DetectorBuild {
                reason: format!("expected [1, 3, H, W] input, got {dims:?}"),
            });
        }
        let (input_height, input_width) = (dims[2], dims[3]);
        if input_height <= 0 || input_width <= 0 {
            return Err(Error::DetectorBuild {
                reason: format!("model input has dynamic spatial dims {dims:?}"),
            });
        }

        info!(
            "loaded detector {} (input {}x{})",
            model_path.display(),
            input_width,
            input_height
        );

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self {
            session: Mutex::new(session),
            input_width: input_width as usize,
            input_height: input_height as usize,
            min_confidence,
        })
    }

    /// Scale tile pixels into the model input tensor.
    ///
    /// Top-left anchored letterbox: the tile is resized by a single
    /// uniform factor and padded right/bottom with the conventional
    /// gray value, so mapping model coordinates back to tile
    /// coordinates is a plain division by the scale.
    fn preprocess(&self, tile: &Tile) -> Result<(Array4<f32>, f32)> {
        let shape = tile.pixels.shape();
        if shape[2] != 3 {
            return Err(Error::Inference {
                reason: format!("expected 3-band tile payload, got {} band(s)", shape[2]),
            });
        }

        let raw: Vec<u8> = tile.pixels.iter().copied().collect();
        #[allow(clippy::cast_possible_truncation)]
        let img = image::RgbImage::from_raw(tile.width as u32, tile.height as u32, raw)
            .ok_or_else(|| Error::Inference {
                reason: "tile payload shape mismatch".to_string(),
            })?;

        #[allow(clippy::cast_precision_loss)]
        let scale = (self.input_width as f32 / tile.width as f32)
            .min(self.input_height as f32 / tile.height as f32)
            .min(1.0);
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let (scaled_w, scaled_h) = (
            ((tile.width as f32 * scale).round() as u32).max(1),
            ((tile.height as f32 * scale).round() as u32).max(1),
        );
        let resized =
            image::imageops::resize(&img, scaled_w, scaled_h, image::imageops::FilterType::Triangle);

        let mut input =
            Array4::<f32>::from_elem((1, 3, self.input_height, self.input_width), 114.0 / 255.0);
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = f32::from(pixel.0[c]) / 255.0;
            }
        }

        Ok((input, scale))
    }

    /// Decode `output0` into thresholded candidates in tile coordinates.
    fn decode_candidates(
        &self,
        shape: &[i64],
        data: &[f32],
        coeff_count: usize,
        scale: f32,
        tile: &Tile,
    ) -> Result<Vec<Candidate>> {
        if shape.len() != 3 || shape.iter().any(|&d| d < 0) {
            return Err(Error::Inference {
                reason: format!("unexpected output0 shape {shape:?}"),
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (features, anchors) = (shape[1] as usize, shape[2] as usize);
        if anchors > MAX_MODEL_ANCHORS || features < 5 + coeff_count {
            return Err(Error::Inference {
                reason: format!("unexpected output0 shape {shape:?}"),
            });
        }
        let class_count = features - 4 - coeff_count;

        let at = |feature: usize, anchor: usize| data[feature * anchors + anchor];
        #[allow(clippy::cast_precision_loss)]
        let (max_x, max_y) = (tile.width as f32, tile.height as f32);

        let mut candidates = Vec::new();
        for anchor in 0..anchors {
            let mut best_score = 0.0f32;
            for class in 0..class_count {
                best_score = best_score.max(at(4 + class, anchor));
            }
            if best_score < self.min_confidence {
                continue;
            }

            let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
            // Model coordinates -> tile coordinates
            let bbox = PixelBox {
                x_min: ((cx - w / 2.0) / scale).clamp(0.0, max_x),
                y_min: ((cy - h / 2.0) / scale).clamp(0.0, max_y),
                x_max: ((cx + w / 2.0) / scale).clamp(0.0, max_x),
                y_max: ((cy + h / 2.0) / scale).clamp(0.0, max_y),
            };
            if bbox.area() <= 0.0 {
                continue;
            }

            let coeffs = (0..coeff_count)
                .map(|k| at(4 + class_count + k, anchor))
                .collect();
            candidates.push(Candidate {
                bbox,
                confidence: best_score,
                coeffs,
            });
        }

        Ok(candidates)
    }

    /// Compose an instance mask from prototypes and trace its outer ring.
    ///
    /// `protos` is `[coeffs, mh * mw]` flattened; the composed mask is
    /// cropped to the candidate's box before tracing, as ultralytics
    /// does. Returned vertices are in tile pixel coordinates.
    #[allow(clippy::cast_precision_loss)]
    fn instance_ring(
        candidate: &Candidate,
        protos: &[f32],
        mask_w: usize,
        mask_h: usize,
        model_w: usize,
        scale: f32,
    ) -> Vec<(f64, f64)> {
        let plane = mask_w * mask_h;
        let mut mask = Array2::<bool>::from_elem((mask_h, mask_w), false);

        // Candidate box in prototype-mask resolution
        let proto_scale = mask_w as f32 / model_w as f32 * scale;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (bx0, by0, bx1, by1) = (
            (candidate.bbox.x_min * proto_scale).floor().max(0.0) as usize,
            (candidate.bbox.y_min * proto_scale).floor().max(0.0) as usize,
            ((candidate.bbox.x_max * proto_scale).ceil() as usize).min(mask_w),
            ((candidate.bbox.y_max * proto_scale).ceil() as usize).min(mask_h),
        );

        for y in by0..by1 {
            for x in bx0..bx1 {
                let mut logit = 0.0f32;
                for (k, &coeff) in candidate.coeffs.iter().enumerate() {
                    logit += coeff * protos[k * plane + y * mask_w + x];
                }
                mask[[y, x]] = sigmoid(logit) > MASK_THRESHOLD;
            }
        }

        let ring = trace_outer_ring(&mask);
        if ring.len() < 3 {
            return Vec::new();
        }

        // Prototype-mask coordinates -> tile coordinates
        let to_tile = 1.0 / f64::from(proto_scale);
        ring.into_iter()
            .map(|(x, y)| (x as f64 * to_tile, y as f64 * to_tile))
            .collect()
    }
}

impl Detector for OnnxDetector {
    fn infer(&self, tile: &Tile) -> Result<Vec<RawDetection>> {
        let (input, scale) = self.preprocess(tile)?;

        let input_value =
            ort::value::Value::from_array(input).map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;
        let mut session = self.session.lock().map_err(|_| Error::Internal {
            message: "detector session lock poisoned".to_string(),
        })?;
        let outputs =
            session
                .run(ort::inputs![input_value])
                .map_err(|e| Error::Inference {
                    reason: e.to_string(),
                })?;

        let output0 = outputs
            .get("output0")
            .or_else(|| outputs.get("output"))
            .ok_or_else(|| Error::Inference {
                reason: "model has no output0".to_string(),
            })?;
        let (raw_shape0, data0) =
            output0
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Inference {
                    reason: e.to_string(),
                })?;
        let shape0: Vec<i64> = raw_shape0.iter().copied().collect();

        // Mask prototypes are absent on detection-only exports
        let protos = outputs
            .get("output1")
            .map(|v| {
                v.try_extract_tensor::<f32>()
                    .map(|(shape, data)| (shape.iter().copied().collect::<Vec<i64>>(), data))
                    .map_err(|e| Error::Inference {
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        let (coeff_count, mask_h, mask_w) = protos.as_ref().map_or((0, 0, 0), |(shape, _)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            if shape.len() == 4 && shape.iter().all(|&d| d > 0) {
                (shape[1] as usize, shape[2] as usize, shape[3] as usize)
            } else {
                (0, 0, 0)
            }
        });

        let candidates =
            self.decode_candidates(&shape0, data0, coeff_count, scale, tile)?;
        let kept = non_max_suppression(candidates, NMS_IOU_THRESHOLD);

        let detections = kept
            .into_iter()
            .map(|candidate| {
                let rings = protos
                    .as_ref()
                    .filter(|_| coeff_count > 0)
                    .map(|(_, proto_data)| {
                        let ring = Self::instance_ring(
                            &candidate,
                            proto_data,
                            mask_w,
                            mask_h,
                            self.input_width,
                            scale,
                        );
                        if ring.is_empty() { vec![] } else { vec![ring] }
                    })
                    .unwrap_or_default();
                RawDetection {
                    confidence: candidate.confidence,
                    bbox: Some(candidate.bbox),
                    rings,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "tile ({},{}) produced {} detection(s)",
            tile.x,
            tile.y,
            detections.len()
        );
        Ok(detections)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Greedy non-maximum suppression, highest confidence first.
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Trace the outer boundary of the largest-first foreground region.
///
/// Moore-neighbor tracing starting from the first foreground pixel in
/// scan order. Returns boundary pixels in traversal order; interior
/// holes and any disjoint secondary regions are ignored (single-ring
/// polygons only).
fn trace_outer_ring(mask: &Array2<bool>) -> Vec<(usize, usize)> {
    let (height, width) = mask.dim();
    let Some(start) = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .find(|&(x, y)| mask[[y, x]])
    else {
        return Vec::new();
    };

    // Moore neighborhood, clockwise from west
    const OFFSETS: [(isize, isize); 8] = [
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
    ];

    let in_bounds = |x: isize, y: isize| {
        x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height
    };
    let is_set = |x: isize, y: isize| in_bounds(x, y) && mask[[y as usize, x as usize]];

    let mut ring = vec![start];
    let mut current = start;
    // Entered the start pixel from the west during the initial scan
    let mut entry_dir = 0usize;
    let step_cap = 4 * width * height;

    for _ in 0..step_cap {
        #[allow(clippy::cast_possible_wrap)]
        let (cx, cy) = (current.0 as isize, current.1 as isize);

        let mut advanced = false;
        for i in 0..8 {
            let dir = (entry_dir + 1 + i) % 8;
            let (dx, dy) = OFFSETS[dir];
            if is_set(cx + dx, cy + dy) {
                #[allow(clippy::cast_sign_loss)]
                let next = ((cx + dx) as usize, (cy + dy) as usize);
                if next == start {
                    return ring;
                }
                ring.push(next);
                current = next;
                // Next scan starts from the direction pointing back at
                // the pixel we came from
                entry_dir = (dir + 4) % 8;
                advanced = true;
                break;
            }
        }
        if !advanced {
            // Isolated pixel
            return ring;
        }
    }

    ring
}
