/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines numeric constants shared by the RBF kernels.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Radius substituted for a radius of exactly zero, so that kernels which
/// divide by the radius stay finite.
pub const DEFAULT_RADIUS: f64 = 1.0;

/// Scale applied to the radius to get the standard deviation of the
/// second gaussian kernel (`sigma = 0.707 * r`).
pub const GAUSSIAN_WIDTH_SCALE: f64 = 0.707;
