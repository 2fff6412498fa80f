use crate::config::ModelType;
use crate::models::gbdt::{GBDTModel, GbdtParams};
use crate::models::linear::{LogisticModel, PenalisedLinearModel};
use crate::models::naive_bayes::MultinomialNB;
use crate::models::svm::{Kernel, SVMClassifier, SVMRegressor};
use crate::models::Estimator;

/// Build an untrained boxed estimator from a `ModelType`.
pub fn build_model(model_type: &ModelType) -> Box<dyn Estimator> {
    match *model_type {
        ModelType::LogisticRegression { c, max_iter, tol } => {
            Box::new(LogisticModel::new(c, max_iter, tol))
        }
        ModelType::LinearSVC { c, eps } => Box::new(SVMClassifier::new(c, eps)),
        ModelType::RidgeClassifier { alpha, max_iter, tol } => {
            Box::new(PenalisedLinearModel::ridge_classifier(alpha, max_iter, tol))
        }
        ModelType::MultinomialNB { alpha } => Box::new(MultinomialNB::new(alpha)),
        ModelType::GBDTClassifier {
            learning_rate,
            max_depth,
            num_boost_round,
            training_optimization_level,
            debug,
        } => Box::new(GBDTModel::classifier(GbdtParams {
            learning_rate,
            max_depth,
            num_boost_round,
            training_optimization_level,
            debug,
        })),
        ModelType::Ridge { alpha, max_iter, tol } => {
            Box::new(PenalisedLinearModel::ridge(alpha, max_iter, tol))
        }
        ModelType::Lasso { alpha, max_iter, tol } => {
            Box::new(PenalisedLinearModel::lasso(alpha, max_iter, tol))
        }
        ModelType::ElasticNet {
            alpha,
            l1_ratio,
            max_iter,
            tol,
        } => Box::new(PenalisedLinearModel::elastic_net(alpha, l1_ratio, max_iter, tol)),
        ModelType::SVR {
            c,
            epsilon,
            kernel_width,
            eps,
        } => Box::new(SVMRegressor::new(
            Kernel::Gaussian { width: kernel_width },
            c,
            epsilon,
            eps,
        )),
        ModelType::SVRLinear { c, epsilon, eps } => {
            Box::new(SVMRegressor::new(Kernel::Linear, c, epsilon, eps))
        }
        ModelType::GBDTRegressor {
            learning_rate,
            max_depth,
            num_boost_round,
            training_optimization_level,
            debug,
        } => Box::new(GBDTModel::regressor(GbdtParams {
            learning_rate,
            max_depth,
            num_boost_round,
            training_optimization_level,
            debug,
        })),
    }
}
