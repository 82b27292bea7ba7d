// ABOUTME: Starter deck templates for the slide-deck application
// ABOUTME: Placeholder cover, overview, flow and closing slides plus a print-ready stylesheet

use crate::deck::{self, SlideConfig};
use crate::errors::{DeckError, Result};
use crate::utils;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Stylesheet written next to the starter slides
pub const STYLESHEET_FILE: &str = "style.css";

pub const COVER: &str = r#"<section class="slide" data-slide="1">
    <div class="slide-header">
        <div class="logo-area"></div>
    </div>
    <div class="slide-content cover">
        <h1 class="cover-title">Presentation Title</h1>
        <p class="cover-subtitle">Subtitle</p>
        <p class="cover-meta">Presenter | Date</p>
    </div>
</section>
"#;

pub const OVERVIEW: &str = r#"<section class="slide" data-slide="2">
    <div class="slide-header">
        <h2 class="slide-title">Overview</h2>
    </div>
    <div class="slide-content">
        <div class="content-grid">
            <div class="text-block">
                <h3>Key points</h3>
                <ul>
                    <li>Business value aligned with goals</li>
                    <li>Core capabilities shown as modules</li>
                    <li>Data and case studies as evidence</li>
                </ul>
            </div>
            <div class="image-block">
                <div class="image-placeholder">Image placeholder</div>
            </div>
        </div>
    </div>
</section>
"#;

pub const FLOW: &str = r#"<section class="slide" data-slide="3">
    <div class="slide-header">
        <h2 class="slide-title">Process</h2>
    </div>
    <div class="slide-content">
        <div class="mermaid">
flowchart LR
    A[Start] --> B[Analyse]
    B --> C[Execute]
    C --> D[Review]
        </div>
    </div>
</section>
"#;

pub const THANKS: &str = r#"<section class="slide" data-slide="4">
    <div class="slide-header">
        <div class="logo-area"></div>
    </div>
    <div class="slide-content cover">
        <h1 class="cover-title">Thank you</h1>
        <p class="cover-subtitle">Questions?</p>
        <div class="contact-info">
            <p>Contact</p>
        </div>
    </div>
</section>
"#;

pub const STYLESHEET: &str = r#"@page {
    size: 1920px 1080px;
    margin: 0;
}

* { box-sizing: border-box; }

body {
    margin: 0;
    font-family: "Helvetica Neue", Arial, sans-serif;
    background: #f4f5f7;
}

.presentation-container {
    position: relative;
    width: 100vw;
    height: 100vh;
    overflow: hidden;
}

.slide {
    display: none;
    position: absolute;
    inset: 0;
    flex-direction: column;
    padding: 64px 96px;
    background: #fff;
}

.slide.active { display: flex; }

.slide-content { flex: 1; overflow: hidden; }

.content-grid {
    display: grid;
    grid-template-columns: 1fr 1fr;
    gap: 48px;
}

.cover { display: flex; flex-direction: column; justify-content: center; }

.navigation {
    position: fixed;
    bottom: 24px;
    right: 32px;
    display: flex;
    gap: 12px;
    align-items: center;
}

.progress-bar {
    position: fixed;
    left: 0;
    bottom: 0;
    width: 100%;
    height: 4px;
    background: #e1e4e8;
}

.progress-fill { height: 100%; width: 0; background: #2f6feb; }

.pdf-page-counter { display: none; }

@media print {
    body { background: #fff; }
    .presentation-container { width: auto; height: auto; overflow: visible; }
    .slide {
        display: flex;
        position: relative;
        width: 1920px;
        height: 1080px;
        page-break-after: always;
        break-after: page;
    }
    .navigation, .progress-bar { display: none; }
    .pdf-page-counter {
        display: block;
        position: absolute;
        right: 48px;
        bottom: 32px;
        font-size: 18px;
        color: #6a737d;
    }
}
"#;

/// Browser runtime written next to the starter slides
pub const PRESENTATION_SCRIPT_FILE: &str = "presentation.js";

/// In-page navigation for built decks.
///
/// Mirrors [`crate::navigation::Navigator`]: bounded stepping, the same key,
/// swipe, wheel and button mapping, lazy diagram rendering and chart resizing
/// for the active slide only. Diagrams are never rendered on load, since
/// hidden slides would render at zero size.
pub const PRESENTATION_SCRIPT: &str = r##"(function () {
    'use strict';

    const SWIPE_THRESHOLD = 50;

    class Presentation {
        constructor() {
            this.slides = Array.from(document.querySelectorAll('.slide'));
            this.total = this.slides.length;
            this.current = Math.max(0, this.slides.findIndex((s) => s.classList.contains('active')));
            this.prevBtn = document.getElementById('prev-btn');
            this.nextBtn = document.getElementById('next-btn');
            this.counter = document.getElementById('slide-counter');
            this.progress = document.querySelector('.progress-fill');
            this.slides.forEach((slide, i) => slide.classList.toggle('active', i === this.current));
            this.updateDisplay();
        }

        next() {
            if (this.current < this.total - 1) this.goTo(this.current + 1);
        }

        previous() {
            if (this.current > 0) this.goTo(this.current - 1);
        }

        goTo(index) {
            if (index < 0 || index >= this.total) return;
            this.slides[this.current].classList.remove('active');
            this.current = index;
            this.slides[this.current].classList.add('active');
            this.updateDisplay();
            document.dispatchEvent(new CustomEvent('slideChange', {
                detail: { currentSlide: this.current, totalSlides: this.total }
            }));
        }

        updateDisplay() {
            if (this.total === 0) return;
            if (this.counter) this.counter.textContent = `${this.current + 1} / ${this.total}`;
            if (this.progress) this.progress.style.width = `${((this.current + 1) / this.total) * 100}%`;
            if (this.prevBtn) this.prevBtn.disabled = this.current === 0;
            if (this.nextBtn) this.nextBtn.disabled = this.current === this.total - 1;

            const slide = this.slides[this.current];
            const pending = slide.querySelectorAll('.mermaid:not([data-processed])');
            if (pending.length > 0 && window.mermaid) {
                try {
                    const done = typeof mermaid.run === 'function'
                        ? mermaid.run({ nodes: pending })
                        : mermaid.init(undefined, pending);
                    if (done && typeof done.catch === 'function') done.catch((e) => console.warn(e));
                } catch (e) {
                    console.warn(e);
                }
            }

            if (window.echarts) {
                slide.querySelectorAll('div[id$="-chart"]').forEach((el) => {
                    const chart = echarts.getInstanceByDom(el);
                    if (chart) chart.resize();
                });
            }
        }

        // Shrink a slide's content until it fits the slide box
        detectAndHandleOverflow(slide) {
            const content = slide.querySelector('.slide-content');
            if (!content) return;
            content.style.transform = '';
            content.style.width = '';
            const overflow = content.scrollHeight / Math.max(content.clientHeight, 1);
            if (overflow > 1) {
                const scale = 1 / overflow;
                content.style.transformOrigin = 'top left';
                content.style.transform = `scale(${scale})`;
                content.style.width = `${100 / scale}%`;
            }
        }

        handleKey(e) {
            switch (e.key) {
                case 'ArrowRight':
                case 'ArrowDown':
                case 'PageDown':
                case ' ':
                    e.preventDefault();
                    this.next();
                    break;
                case 'ArrowLeft':
                case 'ArrowUp':
                case 'PageUp':
                    e.preventDefault();
                    this.previous();
                    break;
                case 'Home':
                    e.preventDefault();
                    this.goTo(0);
                    break;
                case 'End':
                    e.preventDefault();
                    this.goTo(this.total - 1);
                    break;
                case 'f':
                case 'F':
                    toggleFullscreen();
                    break;
            }
        }

        handleSwipe(startX, endX) {
            const diff = startX - endX;
            if (Math.abs(diff) <= SWIPE_THRESHOLD) return;
            if (diff > 0) this.next(); else this.previous();
        }
    }

    function toggleFullscreen() {
        if (!document.fullscreenElement) {
            document.documentElement.requestFullscreen().catch((e) => console.warn(e));
        } else if (document.exitFullscreen) {
            document.exitFullscreen();
        }
    }

    // Listeners are bound once and always reach the current instance
    function bindInput() {
        const current = () => window.presentation;
        const prevBtn = document.getElementById('prev-btn');
        const nextBtn = document.getElementById('next-btn');
        if (prevBtn) prevBtn.addEventListener('click', () => current().previous());
        if (nextBtn) nextBtn.addEventListener('click', () => current().next());
        document.addEventListener('keydown', (e) => current().handleKey(e));

        let touchStartX = 0;
        document.addEventListener('touchstart', (e) => {
            touchStartX = e.changedTouches[0].screenX;
        });
        document.addEventListener('touchend', (e) => {
            current().handleSwipe(touchStartX, e.changedTouches[0].screenX);
        });
        document.addEventListener('wheel', (e) => {
            if (e.deltaY > 0) current().next();
            else if (e.deltaY < 0) current().previous();
        }, { passive: true });
    }

    window.addSlide = function (html, position = -1) {
        const container = document.querySelector('.presentation-container');
        const holder = document.createElement('div');
        holder.innerHTML = html.trim();
        const slide = holder.firstElementChild;
        if (!container || !slide) return;
        slide.classList.remove('active');
        if (position < 0 || position >= container.children.length) {
            container.appendChild(slide);
        } else {
            container.insertBefore(slide, container.children[position]);
        }
        document.querySelectorAll('.slide.active').forEach((s) => s.classList.remove('active'));
        const first = container.querySelector('.slide');
        if (first) first.classList.add('active');
        window.presentation = new Presentation();
    };

    window.toggleFullscreen = toggleFullscreen;

    function start() {
        if (window.mermaid && typeof mermaid.initialize === 'function') {
            mermaid.initialize({
                startOnLoad: false,
                theme: 'default',
                securityLevel: 'loose',
                flowchart: { useMaxWidth: true, htmlLabels: true }
            });
        }
        window.presentation = new Presentation();
        bindInput();
    }

    if (document.readyState === 'loading') {
        document.addEventListener('DOMContentLoaded', start);
    } else {
        start();
    }
})();
"##;

/// The starter render order and the fragment written for each entry
pub fn starter_slides() -> Vec<(SlideConfig, &'static str)> {
    vec![
        (SlideConfig::new("slide-01", "slides/slide-01-cover.html", "Cover"), COVER),
        (SlideConfig::new("slide-02", "slides/slide-02-overview.html", "Overview"), OVERVIEW),
        (SlideConfig::new("slide-03", "slides/slide-03-flow.html", "Process"), FLOW),
        (SlideConfig::new("slide-04", "slides/slide-04-thanks.html", "Closing"), THANKS),
    ]
}

/// Write a starter deck into `dir`: fragments, manifest, stylesheet and script.
///
/// Refuses to touch a directory that already holds a manifest.
pub fn init_deck(dir: &Path) -> Result<Vec<PathBuf>> {
    utils::validate_directory_writable(dir)?;

    if dir.join(deck::MANIFEST_FILE).exists() {
        return Err(DeckError::ValidationError(format!(
            "{:?} already contains a {}",
            dir,
            deck::MANIFEST_FILE
        )));
    }

    let mut written = Vec::new();
    let mut manifest = Vec::new();

    for (entry, fragment) in starter_slides() {
        let path = dir.join(&entry.source_file);
        utils::ensure_parent_directory_exists(&path)?;
        fs::write(&path, fragment)?;
        written.push(path);
        manifest.push(entry);
    }

    let stylesheet = dir.join(STYLESHEET_FILE);
    fs::write(&stylesheet, STYLESHEET)?;
    written.push(stylesheet);

    let script = dir.join(PRESENTATION_SCRIPT_FILE);
    fs::write(&script, PRESENTATION_SCRIPT)?;
    written.push(script);

    deck::save_manifest(dir, &manifest)?;
    written.push(dir.join(deck::MANIFEST_FILE));

    info!("Initialised deck in {:?} ({} files)", dir, written.len());
    Ok(written)
}
